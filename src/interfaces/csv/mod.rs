pub mod order_writer;
