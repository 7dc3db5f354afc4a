use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use crate::mesh::raster::RasterImage;

pub enum LoaderCommand {
    Decode { data_url: String },
    Stop,
}

pub enum LoaderResult {
    Decoded(RasterImage),
    Error(String),
}

/// Decodes persisted data-URL images off the frame thread.
///
/// Every request produces exactly one result until the loader is stopped; the
/// frame loop drains them with [`MeshLoader::try_recv`]. Requests still queued
/// when the loader stops are discarded.
pub struct MeshLoader {
    tx_cmd: Sender<LoaderCommand>,
    rx_result: Receiver<LoaderResult>,
    last_error: Arc<Mutex<Option<String>>>,
    stopping: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MeshLoader {
    pub fn new() -> Self {
        let (tx_cmd, rx_cmd) = channel::unbounded::<LoaderCommand>();
        let (tx_result, rx_result) = channel::bounded::<LoaderResult>(2);
        let last_error = Arc::new(Mutex::new(None));
        let last_error_clone = Arc::clone(&last_error);
        let stopping = Arc::new(AtomicBool::new(false));
        let stopping_clone = Arc::clone(&stopping);

        let thread_handle = thread::Builder::new()
            .name("heightview-decode".into())
            .spawn(move || {
                decode_thread(rx_cmd, tx_result, last_error_clone, stopping_clone);
            })
            .map_err(|e| error!("failed to spawn decode thread: {e}"))
            .ok();

        Self {
            tx_cmd,
            rx_result,
            last_error,
            stopping,
            thread_handle,
        }
    }

    pub fn request(&self, data_url: impl Into<String>) {
        let _ = self.tx_cmd.send(LoaderCommand::Decode {
            data_url: data_url.into(),
        });
    }

    pub fn try_recv(&self) -> Option<LoaderResult> {
        self.rx_result.try_recv().ok()
    }

    /// Message of the most recent failed decode, cleared when the next one
    /// starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        let _ = self.tx_cmd.send(LoaderCommand::Stop);
    }
}

impl Default for MeshLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MeshLoader {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.thread_handle.take() {
            // the worker may be blocked on a full result channel
            while !handle.is_finished() {
                let _ = self.rx_result.recv_timeout(Duration::from_millis(10));
            }
            let _ = handle.join();
        }
    }
}

fn decode_thread(
    rx_cmd: Receiver<LoaderCommand>,
    tx_result: Sender<LoaderResult>,
    last_error: Arc<Mutex<Option<String>>>,
    stopping: Arc<AtomicBool>,
) {
    loop {
        let cmd = match rx_cmd.recv() {
            Ok(c) => c,
            Err(_) => return,
        };

        match cmd {
            LoaderCommand::Decode { .. } if stopping.load(Ordering::Acquire) => return,
            LoaderCommand::Decode { data_url } => {
                *last_error.lock() = None;

                match RasterImage::decode_data_url(&data_url) {
                    Ok(image) => {
                        info!(
                            width = image.width(),
                            height = image.height(),
                            "decoded heightmap image"
                        );
                        let _ = tx_result.send(LoaderResult::Decoded(image));
                    }
                    Err(e) => {
                        error!("failed to load image: {e}");
                        let message = e.to_string();
                        *last_error.lock() = Some(message.clone());
                        let _ = tx_result.send(LoaderResult::Error(message));
                    }
                }
            }
            LoaderCommand::Stop => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn tiny_png_url() -> String {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(bytes.into_inner()))
    }

    fn recv(loader: &MeshLoader) -> Option<LoaderResult> {
        loader.rx_result.recv_timeout(Duration::from_secs(5)).ok()
    }

    #[test]
    fn delivers_each_decode_once() {
        let loader = MeshLoader::new();
        loader.request(tiny_png_url());

        match recv(&loader) {
            Some(LoaderResult::Decoded(image)) => {
                assert_eq!((image.width(), image.height()), (2, 2));
            }
            _ => panic!("expected decoded image"),
        }
        assert!(loader.try_recv().is_none());
        assert!(loader.last_error().is_none());
    }

    #[test]
    fn decode_failure_is_reported() {
        let loader = MeshLoader::new();
        loader.request("data:image/png;base64,AAAA");

        assert!(matches!(recv(&loader), Some(LoaderResult::Error(_))));
        assert!(loader.last_error().is_some());
    }

    #[test]
    fn drop_returns_with_undrained_results() {
        let loader = MeshLoader::new();
        for _ in 0..4 {
            loader.request(tiny_png_url());
        }
        // let the worker fill the result channel
        std::thread::sleep(Duration::from_millis(200));

        let (tx_done, rx_done) = channel::bounded(1);
        std::thread::spawn(move || {
            loader.stop();
            drop(loader);
            let _ = tx_done.send(());
        });

        assert!(rx_done.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn stopped_loader_discards_queued_requests() {
        let loader = MeshLoader::new();
        loader.stop();
        loader.request(tiny_png_url());

        assert!(recv(&loader).is_none());
    }
}
