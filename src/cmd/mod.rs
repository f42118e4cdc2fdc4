pub mod replay;
pub mod simulate;
pub mod sweep;
