pub mod block_window_output;
pub mod framed_block_input;
