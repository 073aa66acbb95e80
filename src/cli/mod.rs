pub mod app;
pub mod commands;
pub mod context;
pub mod debug;
pub mod dispatch;
pub mod env;
pub mod explain;
pub mod output;
pub mod parse;
pub mod patterns;
pub mod run;
pub mod runtime;
