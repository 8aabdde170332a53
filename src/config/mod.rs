mod settings;

pub use settings::{parse_id_list, Settings};
