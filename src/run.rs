pub(crate) mod cli;

pub(crate) use cli::as_cli;
