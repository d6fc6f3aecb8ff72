pub mod config;

pub mod errors {
    pub mod error_types;
}

pub mod data {
    pub mod loader;
    pub mod ski_data;
}

pub mod ui {
    pub mod cluster;
    pub mod fly_to;
    pub mod info_modal;
    pub mod legend;
    pub mod lib;
    pub mod locate;
    pub mod map;
    pub mod overlay;
    pub mod places;
    pub mod plugins;
    pub mod provider;
    pub mod selector;
    pub mod tiles;
    pub mod windows;
}
