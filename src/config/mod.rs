pub mod schema;

pub use schema::{
    BoardConfig, BroadcastConfig, ENV_HOT_TOKEN, ENV_HOT_URL, ENV_PRIMARY_TOKEN, ENV_PRIMARY_URL,
    SessionConfig, StoreEndpoint, default_config_path,
};
