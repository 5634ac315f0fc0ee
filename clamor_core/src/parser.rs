mod arguments;
mod options;
mod pile;

pub use arguments::ParsedArguments;
pub(crate) use arguments::ArgumentParser;
pub(crate) use options::OptionTable;
pub(crate) use pile::split;
