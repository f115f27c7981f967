pub mod balance_reader;
pub mod report_writer;
