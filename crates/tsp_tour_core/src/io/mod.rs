pub mod dialog;
pub mod options;
