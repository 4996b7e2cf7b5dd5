pub mod feed;
pub mod heartbeat;
pub mod history;
pub mod live_chat;
pub mod notes;
pub mod player;
pub mod quotes;
pub mod session;
pub mod storage;
pub mod theme;
pub mod tracker;
