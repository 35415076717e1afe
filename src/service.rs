//! Background request handling.
//!
//! An [`AnnotationService`] owns one worker thread fed by a queue that holds
//! a single request. While a request is queued or running, further
//! submissions are refused with [`Error::Busy`]. Every finished request
//! updates the shared [`LastOutcome`] and is also delivered as an
//! [`Outcome`] on the notification channel.
//!
//! ```no_run
//! use pdf_annotator::config::AnnotatorConfig;
//! use pdf_annotator::service::{AnnotationService, Request};
//!
//! let mut service = AnnotationService::start(AnnotatorConfig::default())?;
//! service.submit(Request::extract("notes.pdf"))?;
//! println!("{}", service.recv_outcome()?.message());
//! service.shutdown();
//! # Ok::<(), pdf_annotator::Error>(())
//! ```

use crate::composer::{compose_to_file, CaptionMode, ComposeOptions, ComposeReport, ImageSource};
use crate::config::{incoming_path, AnnotatorConfig};
use crate::engine::NativeEngine;
use crate::error::{Error, ErrorKind, Result};
use crate::extractor::{extract_file, AnnotationRecord, NO_ANNOTATIONS_MESSAGE};
use crate::storage::Storage;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Work the service performs.
#[derive(Debug, Clone)]
pub enum Request {
    /// Cache the images and compose them into a new document.
    Compose {
        /// Selected images, in order
        images: Vec<ImageSource>,
        /// Caption; the configured default when absent or blank
        caption: Option<String>,
        /// Caption mode; the configured mode when absent
        mode: Option<CaptionMode>,
    },
    /// List the comments of an existing document.
    Extract {
        /// Document to read
        path: PathBuf,
    },
}

impl Request {
    /// Compose `images` with `caption` in the configured mode.
    pub fn compose(images: Vec<ImageSource>, caption: Option<String>) -> Self {
        Request::Compose {
            images,
            caption,
            mode: None,
        }
    }

    /// Extract the comments of `path`.
    pub fn extract(path: impl Into<PathBuf>) -> Self {
        Request::Extract { path: path.into() }
    }

    /// The kind of this request.
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Compose { .. } => RequestKind::Compose,
            Request::Extract { .. } => RequestKind::Extract,
        }
    }
}

/// Which entry point a request used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Composition
    Compose,
    /// Extraction
    Extract,
}

/// Result of one finished request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A document was composed and saved.
    Composed(ComposeReport),
    /// A document was read.
    Extracted {
        /// Document that was read
        source: PathBuf,
        /// Listed comments
        records: Vec<AnnotationRecord>,
    },
    /// The request failed.
    Failed {
        /// Request that failed
        request: RequestKind,
        /// Failure category
        kind: ErrorKind,
        /// User-facing message (`Error: ...`)
        message: String,
    },
}

impl Outcome {
    fn failed(request: RequestKind, error: &Error) -> Self {
        Outcome::Failed {
            request,
            kind: error.kind(),
            message: error.user_message(),
        }
    }

    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed { .. })
    }

    /// One-line message for the user.
    pub fn message(&self) -> String {
        match self {
            Outcome::Composed(report) => match &report.output {
                Some(path) => format!("PDF saved to {}", path.display()),
                None => format!("Composed {} page(s)", report.pages),
            },
            Outcome::Extracted { records, .. } if records.is_empty() => NO_ANNOTATIONS_MESSAGE.to_string(),
            Outcome::Extracted { records, .. } => format!("Found {} annotation(s)", records.len()),
            Outcome::Failed { message, .. } => message.clone(),
        }
    }
}

/// State observed by the interactive side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastOutcome {
    /// Most recent composed document; cleared by a failed composition
    pub last_result_path: Option<PathBuf>,
    /// Message of the most recent failure; cleared by a success
    pub last_error: Option<String>,
    /// Records of the most recent extraction; empty after a failed one
    pub last_annotations: Vec<AnnotationRecord>,
}

impl LastOutcome {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Composed(report) => {
                self.last_result_path = report.output.clone();
                self.last_error = None;
            },
            Outcome::Extracted { records, .. } => {
                self.last_annotations = records.clone();
                self.last_error = None;
            },
            Outcome::Failed { request, message, .. } => {
                match request {
                    RequestKind::Compose => self.last_result_path = None,
                    RequestKind::Extract => self.last_annotations.clear(),
                }
                self.last_error = Some(message.clone());
            },
        }
    }
}

/// Single-worker request service.
pub struct AnnotationService {
    config: AnnotatorConfig,
    requests: Option<Sender<Request>>,
    outcomes: Receiver<Outcome>,
    busy: Arc<AtomicBool>,
    state: Arc<Mutex<LastOutcome>>,
    worker: Option<JoinHandle<()>>,
}

impl AnnotationService {
    /// Spawn the worker.
    pub fn start(config: AnnotatorConfig) -> Result<Self> {
        Self::start_with(config, process)
    }

    fn start_with<F>(config: AnnotatorConfig, mut run: F) -> Result<Self>
    where
        F: FnMut(&AnnotatorConfig, Request) -> Outcome + Send + 'static,
    {
        let (request_tx, request_rx) = bounded::<Request>(1);
        let (outcome_tx, outcome_rx) = unbounded::<Outcome>();
        let busy = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(LastOutcome::default()));

        let worker = {
            let config = config.clone();
            let busy = Arc::clone(&busy);
            let state = Arc::clone(&state);
            thread::Builder::new()
                .name("pdf-annotator-worker".into())
                .spawn(move || {
                    for request in request_rx.iter() {
                        let outcome = run(&config, request);
                        lock(&state).record(&outcome);
                        busy.store(false, Ordering::Release);
                        // The receiver may already be gone.
                        let _ = outcome_tx.send(outcome);
                    }
                    log::debug!("Worker queue closed");
                })?
        };

        log::info!("Annotation service started (storage {})", config.storage_root.display());
        Ok(Self {
            config,
            requests: Some(request_tx),
            outcomes: outcome_rx,
            busy,
            state,
            worker: Some(worker),
        })
    }

    /// The service configuration.
    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Whether a request is queued or running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Queue `request` without blocking.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] while another request is outstanding,
    /// [`Error::WorkerStopped`] after shutdown.
    pub fn submit(&self, request: Request) -> Result<()> {
        let sender = self.requests.as_ref().ok_or(Error::WorkerStopped)?;
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }

        log::debug!("Submitting {:?} request", request.kind());
        match sender.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(Error::Busy),
            Err(TrySendError::Disconnected(_)) => {
                self.busy.store(false, Ordering::Release);
                Err(Error::WorkerStopped)
            },
        }
    }

    /// Accept a document handed over by the host, if it is a PDF.
    ///
    /// # Errors
    ///
    /// [`Error::NotPdf`] when the configured detection rejects it,
    /// [`Error::UnsupportedLocation`] when it has no local path, otherwise
    /// as [`submit`](Self::submit).
    pub fn open_incoming(&self, location: &str, declared_mime: Option<&str>) -> Result<()> {
        if !self.config.pdf_detection.accepts(location, declared_mime) {
            log::warn!("Rejected incoming document {} ({:?})", location, declared_mime);
            return Err(Error::NotPdf(location.to_string()));
        }
        let path = incoming_path(location)?;
        self.submit(Request::extract(path))
    }

    /// Snapshot of the shared state.
    pub fn last_outcome(&self) -> LastOutcome {
        lock(&self.state).clone()
    }

    /// Wait for the next finished request.
    pub fn recv_outcome(&self) -> Result<Outcome> {
        self.outcomes.recv().map_err(|_| Error::WorkerStopped)
    }

    /// Wait up to `timeout` for the next finished request.
    pub fn recv_outcome_timeout(&self, timeout: Duration) -> Result<Option<Outcome>> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerStopped),
        }
    }

    /// Close the queue and wait for the worker to finish its current request.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for AnnotationService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AnnotationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationService")
            .field("config", &self.config)
            .field("busy", &self.is_busy())
            .field("running", &self.worker.is_some())
            .finish()
    }
}

fn lock(state: &Mutex<LastOutcome>) -> std::sync::MutexGuard<'_, LastOutcome> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run one request to completion.
fn process(config: &AnnotatorConfig, request: Request) -> Outcome {
    let kind = request.kind();
    let result = match request {
        Request::Compose { images, caption, mode } => {
            run_compose(config, &images, caption.as_deref(), mode).map(Outcome::Composed)
        },
        Request::Extract { path } => {
            extract_file(&mut NativeEngine::new(), &path).map(|records| Outcome::Extracted { source: path, records })
        },
    };

    result.unwrap_or_else(|e| {
        log::error!("{:?} request failed: {}", kind, e);
        Outcome::failed(kind, &e)
    })
}

fn run_compose(
    config: &AnnotatorConfig,
    images: &[ImageSource],
    caption: Option<&str>,
    mode: Option<CaptionMode>,
) -> Result<ComposeReport> {
    if images.is_empty() {
        return Err(Error::NoImages);
    }

    let storage = Storage::new(&config.storage_root);
    let cached = storage.cache_images(images)?;
    if cached.len() != config.required_images {
        return Err(Error::ImageCount {
            expected: config.required_images,
            actual: cached.len(),
        });
    }

    let output = storage.prepare_output()?;
    let options = ComposeOptions::new(caption.unwrap_or_default())
        .with_default_caption(config.default_caption.clone())
        .with_mode(mode.unwrap_or(config.mode))
        .with_font(config.caption_font)
        .with_author(config.annotation_author.clone())
        .with_compress(config.compress);
    let sources: Vec<ImageSource> = cached.into_iter().map(ImageSource::Path).collect();

    compose_to_file(&mut NativeEngine::new(), &sources, &options, &output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn images(count: usize) -> Vec<ImageSource> {
        (0..count).map(|i| ImageSource::Bytes(png(8 + i as u32, 6))).collect()
    }

    fn config(root: &std::path::Path) -> AnnotatorConfig {
        AnnotatorConfig::new().with_storage_root(root)
    }

    const WAIT: Duration = Duration::from_secs(30);

    #[test]
    fn test_compose_then_extract() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = AnnotationService::start(config(dir.path())).unwrap();

        service
            .submit(Request::compose(images(5), Some("made in India".into())))
            .unwrap();
        let outcome = service.recv_outcome_timeout(WAIT).unwrap().unwrap();
        let Outcome::Composed(report) = &outcome else {
            panic!("unexpected outcome {:?}", outcome);
        };
        let path = report.output.clone().unwrap();
        assert!(path.starts_with(dir.path().join("pdfs")));
        assert!(path.is_file());
        assert_eq!(service.last_outcome().last_result_path.as_ref(), Some(&path));
        assert_eq!(std::fs::read_dir(dir.path().join("Pictures")).unwrap().count(), 5);

        service.submit(Request::extract(&path)).unwrap();
        let outcome = service.recv_outcome_timeout(WAIT).unwrap().unwrap();
        let Outcome::Extracted { records, .. } = outcome else {
            panic!("extraction failed");
        };
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.content == "made in India"));
        assert_eq!(service.last_outcome().last_annotations, records);

        service.shutdown();
    }

    #[test]
    fn test_wrong_image_count() {
        let dir = tempfile::tempdir().unwrap();
        let service = AnnotationService::start(config(dir.path())).unwrap();

        let mut sources = images(4);
        sources.push(ImageSource::Path(dir.path().join("gone.jpg")));
        service.submit(Request::compose(sources, None)).unwrap();

        let outcome = service.recv_outcome_timeout(WAIT).unwrap().unwrap();
        assert_eq!(outcome.message(), "Error: Expected 5 images but processed 4");
        let state = service.last_outcome();
        assert!(state.last_result_path.is_none());
        assert_eq!(state.last_error.as_deref(), Some("Error: Expected 5 images but processed 4"));
        assert!(!dir.path().join("pdfs").exists());
    }

    #[test]
    fn test_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let service = AnnotationService::start(config(dir.path())).unwrap();
        service.submit(Request::compose(Vec::new(), None)).unwrap();
        let outcome = service.recv_outcome_timeout(WAIT).unwrap().unwrap();
        assert_eq!(outcome.message(), "Error: No images provided");
    }

    #[test]
    fn test_extract_failure_clears_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.pdf");
        std::fs::write(&bogus, b"this is not a pdf").unwrap();

        let service = AnnotationService::start(config(dir.path())).unwrap();
        service.open_incoming(bogus.to_str().unwrap(), None).unwrap();
        let outcome = service.recv_outcome_timeout(WAIT).unwrap().unwrap();
        match outcome {
            Outcome::Failed { request, kind, .. } => {
                assert_eq!(request, RequestKind::Extract);
                assert_eq!(kind, ErrorKind::Parse);
            },
            other => panic!("unexpected {:?}", other),
        }
        let state = service.last_outcome();
        assert!(state.last_annotations.is_empty());
        assert!(state.last_error.unwrap().starts_with("Error: "));
    }

    #[test]
    fn test_open_incoming_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let service = AnnotationService::start(config(dir.path())).unwrap();
        assert!(matches!(
            service.open_incoming("photo.jpg", Some("image/jpeg")),
            Err(Error::NotPdf(_))
        ));
        assert!(!service.is_busy());
    }

    #[test]
    fn test_busy_while_running() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let service = AnnotationService::start_with(AnnotatorConfig::new(), move |_, request| {
            let _ = release_rx.recv();
            Outcome::Extracted {
                source: match request {
                    Request::Extract { path } => path,
                    Request::Compose { .. } => PathBuf::new(),
                },
                records: Vec::new(),
            }
        })
        .unwrap();

        service.submit(Request::extract("a.pdf")).unwrap();
        assert!(service.is_busy());
        assert!(matches!(service.submit(Request::extract("b.pdf")), Err(Error::Busy)));

        release_tx.send(()).unwrap();
        let outcome = service.recv_outcome_timeout(WAIT).unwrap().unwrap();
        assert_eq!(outcome.message(), NO_ANNOTATIONS_MESSAGE);
        assert!(!service.is_busy());

        service.submit(Request::extract("c.pdf")).unwrap();
        release_tx.send(()).unwrap();
        let Outcome::Extracted { source, .. } = service.recv_outcome_timeout(WAIT).unwrap().unwrap() else {
            panic!("unexpected outcome");
        };
        assert_eq!(source, PathBuf::from("c.pdf"));
    }

    #[test]
    fn test_submit_after_shutdown() {
        let mut service = AnnotationService::start(AnnotatorConfig::new()).unwrap();
        service.shutdown();
        assert!(matches!(service.submit(Request::extract("x.pdf")), Err(Error::WorkerStopped)));
        assert!(matches!(service.recv_outcome(), Err(Error::WorkerStopped)));
    }

    #[test]
    fn test_last_outcome_transitions() {
        let mut state = LastOutcome::default();
        let report = ComposeReport {
            pages: 5,
            caption: "c".into(),
            mode: CaptionMode::Annotated,
            output: Some(PathBuf::from("out.pdf")),
        };
        state.record(&Outcome::Composed(report));
        assert_eq!(state.last_result_path, Some(PathBuf::from("out.pdf")));

        state.record(&Outcome::failed(RequestKind::Extract, &Error::InvalidXref));
        assert_eq!(state.last_result_path, Some(PathBuf::from("out.pdf")));
        assert!(state.last_error.is_some());

        state.record(&Outcome::failed(RequestKind::Compose, &Error::NoImages));
        assert!(state.last_result_path.is_none());
        assert_eq!(state.last_error.as_deref(), Some("Error: No images provided"));
    }
}
