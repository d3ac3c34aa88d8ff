pub mod cancel_hold_cmd;
pub mod enqueue_hold_cmd;
pub mod list_queue_cmd;
