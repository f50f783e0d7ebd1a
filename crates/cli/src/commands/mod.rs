pub mod generate;
pub mod inspect;
pub mod replay;
pub mod timeline;
