use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::config::Settings;
use crate::error::ViewerError;
use crate::model::PresenceLog;

/// Where the presence log comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Full URL of the `/db` endpoint.
    Server(String),
    File(PathBuf),
}

impl DataSource {
    /// A configured database file wins over the server.
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.db_path {
            Some(path) => Self::File(path.clone()),
            None => Self::Server(settings.endpoint()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Server(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Fetch and parse the presence log. Blocks the calling thread.
pub fn fetch_log(source: &DataSource, timeout: Duration) -> Result<PresenceLog, ViewerError> {
    match source {
        DataSource::Server(url) => {
            tracing::debug!("GET {}", url);
            let agent = ureq::AgentBuilder::new().timeout(timeout).build();
            let response = agent.get(url).call().map_err(|e| ViewerError::Http {
                url: url.clone(),
                source: Box::new(e),
            })?;
            // Read through the reader: `into_string` caps bodies at 10 MB and
            // the log carries base64 thumbnails.
            let log: PresenceLog = serde_json::from_reader(response.into_reader())?;
            Ok(log)
        }
        DataSource::File(path) => super::file::load_log(path),
    }
}

/// Result of one background load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub source: DataSource,
    pub result: Result<PresenceLog, ViewerError>,
}

/// Runs loads on worker threads so the UI never waits on the network.
///
/// Every request gets a new generation number; only the outcome of the most
/// recent request is handed back, older ones are dropped on arrival.
pub struct Loader {
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    generation: u64,
    in_flight: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            generation: 0,
            in_flight: 0,
        }
    }

    /// Start a load and wake the UI when it finishes.
    pub fn request(&mut self, source: DataSource, timeout: Duration, ctx: &egui::Context) -> u64 {
        let ctx = ctx.clone();
        self.request_with(source, timeout, move || ctx.request_repaint())
    }

    pub fn request_with(
        &mut self,
        source: DataSource,
        timeout: Duration,
        on_done: impl FnOnce() + Send + 'static,
    ) -> u64 {
        self.generation += 1;
        self.in_flight += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let worker_source = source.clone();

        let spawned = thread::Builder::new()
            .name("presence-loader".to_string())
            .spawn(move || {
                let result = fetch_log(&worker_source, timeout);
                match &result {
                    Ok(log) => tracing::info!(
                        generation,
                        users = log.users.len(),
                        "loaded presence log from {}",
                        worker_source.describe()
                    ),
                    Err(e) => tracing::warn!(generation, "load failed: {}", e),
                }
                // The receiver is gone only when the app is shutting down.
                let _ = tx.send(LoadOutcome {
                    generation,
                    source: worker_source,
                    result,
                });
                on_done();
            });

        if let Err(e) = spawned {
            tracing::error!("could not start loader thread: {}", e);
            let _ = self.tx.send(LoadOutcome {
                generation,
                source,
                result: Err(ViewerError::LoaderGone),
            });
        }
        generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Take the newest finished outcome, if it belongs to the latest request.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let mut latest = None;
        while let Ok(outcome) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if outcome.generation == self.generation {
                latest = Some(outcome);
            } else {
                tracing::debug!(
                    stale = outcome.generation,
                    current = self.generation,
                    "dropping superseded load"
                );
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::Instant;

    fn wait_for(loader: &mut Loader) -> Option<LoadOutcome> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(outcome) = loader.poll() {
                return Some(outcome);
            }
            if !loader.is_loading() {
                return None;
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    fn read_request(stream: &mut TcpStream) {
        let mut request = Vec::new();
        let mut buf = [0u8; 512];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
    }

    /// Answer a single request with `response`, returning the `/db` URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/db", addr)
    }

    /// Accept a single request and never answer it.
    fn serve_nothing(hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                thread::sleep(hold);
            }
        });
        format!("http://{}/db", addr)
    }

    fn db_file(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn source_prefers_db_file() {
        let mut settings = Settings::default();
        assert_eq!(
            DataSource::from_settings(&settings),
            DataSource::Server("http://127.0.0.1:5000/db".into())
        );
        settings.db_path = Some(PathBuf::from("/tmp/db.json"));
        assert_eq!(
            DataSource::from_settings(&settings),
            DataSource::File(PathBuf::from("/tmp/db.json"))
        );
    }

    #[test]
    fn loader_delivers_file_contents() {
        let file = db_file(r#"{"alice": {"online": [[1000, 2000]]}}"#);
        let mut loader = Loader::new();
        let generation =
            loader.request_with(DataSource::File(file.path().into()), Duration::from_secs(1), || {});
        let outcome = wait_for(&mut loader).expect("load outcome");
        assert_eq!(outcome.generation, generation);
        assert_eq!(outcome.result.unwrap().users.len(), 1);
        assert!(!loader.is_loading());
    }

    #[test]
    fn superseded_loads_are_dropped() {
        let first = db_file(r#"{"old": {}}"#);
        let second = db_file(r#"{"new": {}}"#);
        let mut loader = Loader::new();
        let (done_tx, done_rx) = mpsc::channel();
        let done_first = done_tx.clone();
        loader.request_with(DataSource::File(first.path().into()), Duration::from_secs(1), move || {
            let _ = done_first.send(());
        });
        let latest =
            loader.request_with(DataSource::File(second.path().into()), Duration::from_secs(1), move || {
                let _ = done_tx.send(());
            });
        for _ in 0..2 {
            done_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        }

        let outcome = loader.poll().expect("latest outcome");
        assert_eq!(outcome.generation, latest);
        assert!(outcome.result.unwrap().users.contains_key("new"));
        assert!(loader.poll().is_none());
        assert!(!loader.is_loading());
    }

    #[test]
    fn unreachable_server_is_reported() {
        let source = DataSource::Server("http://127.0.0.1:1/db".into());
        let err = fetch_log(&source, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, ViewerError::Http { .. }));
        assert!(err.to_string().contains("127.0.0.1:1/db"));
    }

    #[test]
    fn server_error_status_is_reported() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let err = fetch_log(&DataSource::Server(url.clone()), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ViewerError::Http { .. }));
        assert!(err.to_string().contains(&url));
    }

    #[test]
    fn non_json_body_is_reported() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot json!",
        );
        let err = fetch_log(&DataSource::Server(url), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ViewerError::Json(_)));
    }

    #[test]
    fn server_response_is_parsed() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 37\r\nConnection: close\r\n\r\n{\"alice\": {\"online\": [[1000, 2000]]}}",
        );
        let log = fetch_log(&DataSource::Server(url), Duration::from_secs(5)).unwrap();
        assert_eq!(log.users["alice"].online.len(), 1);
    }

    #[test]
    fn newer_request_wins_over_stuck_fetch() {
        let stuck = serve_nothing(Duration::from_secs(3));
        let file = db_file(r#"{"fresh": {}}"#);
        let mut loader = Loader::new();
        loader.request_with(DataSource::Server(stuck), Duration::from_secs(5), || {});

        let (done_tx, done_rx) = mpsc::channel();
        let latest =
            loader.request_with(DataSource::File(file.path().into()), Duration::from_secs(1), move || {
                let _ = done_tx.send(());
            });
        done_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        let outcome = loader.poll().expect("latest outcome");
        assert_eq!(outcome.generation, latest);
        assert!(outcome.result.unwrap().users.contains_key("fresh"));
        // The stuck fetch is still running; its result will be dropped
        assert!(loader.is_loading());
    }
}
