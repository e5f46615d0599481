mod bootstrap;
mod level_file;
mod loop_runner;

pub(crate) use loop_runner::run;
