use std::fs;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use log::{error, info};
use threadpool::ThreadPool;

use crate::config::DataSource;
use crate::data::ski_data::SkiDataset;
use crate::errors::error_types::ErrorTypes;

/// Loading state of the dataset, as seen by the root view.
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<SkiDataset>),
    Error(ErrorTypes),
}

/// Fetches the dataset once, on a worker thread, and hands the result back to
/// the UI thread through a channel.
pub struct DataLoader {
    source: DataSource,
    state: LoadState,
    receiver: Option<Receiver<Result<SkiDataset, ErrorTypes>>>,
    started: bool,
}

impl DataLoader {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            state: LoadState::Loading,
            receiver: None,
            started: false,
        }
    }

    /// Submits the fetch to `pool`. Only the first call has an effect.
    ///
    /// # Arguments
    /// * `pool` - Worker pool that runs the blocking fetch.
    /// * `on_done` - Called from the worker once the result is sent, usually to
    ///   request a repaint.
    pub fn start(&mut self, pool: &ThreadPool, on_done: impl FnOnce() + Send + 'static) {
        if self.started {
            return;
        }
        self.started = true;

        let (sender, receiver) = mpsc::channel();
        let source = self.source.clone();
        self.receiver = Some(receiver);

        info!("Loading map data from {}", source);
        pool.execute(move || {
            let _ = sender.send(fetch_dataset(&source));
            on_done();
        });
    }

    /// Applies the worker's result if it arrived and returns the current state.
    pub fn poll(&mut self) -> &LoadState {
        let received = match &self.receiver {
            Some(receiver) => match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(ErrorTypes::new(
                    107,
                    "Map data worker stopped without a result".to_string(),
                ))),
            },
            None => None,
        };

        if let Some(result) = received {
            self.receiver = None;
            self.state = match result {
                Ok(dataset) => {
                    info!("Loaded {} ski areas", dataset.len());
                    LoadState::Ready(Arc::new(dataset))
                }
                Err(e) => {
                    error!("Failed to load map data: {}", e);
                    LoadState::Error(e)
                }
            };
        }

        &self.state
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

/// Reads and parses the dataset from `source`. Blocking.
pub fn fetch_dataset(source: &DataSource) -> Result<SkiDataset, ErrorTypes> {
    match source {
        DataSource::File(path) => {
            let bytes = fs::read(path).map_err(|e| {
                ErrorTypes::new(
                    101,
                    format!("Failed to read {}: {}", path.display(), e),
                )
            })?;
            SkiDataset::from_json(&bytes)
        }
        DataSource::Http(url) => {
            let response = reqwest::blocking::get(url)
                .map_err(|e| ErrorTypes::new(102, format!("Request to {} failed: {}", url, e)))?;
            if !response.status().is_success() {
                return Err(ErrorTypes::new(
                    103,
                    format!("{} responded with {}", url, response.status()),
                ));
            }
            let bytes = response
                .bytes()
                .map_err(|e| ErrorTypes::new(104, format!("Failed to read response body: {}", e)))?;

            let mut dataset = SkiDataset::from_json(&bytes)?;
            dataset.resolve_tile_url(Some(url));
            Ok(dataset)
        }
    }
}
