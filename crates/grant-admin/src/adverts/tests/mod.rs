mod common;
mod publish;
