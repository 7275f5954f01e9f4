mod common;
mod gate;
mod wire;
