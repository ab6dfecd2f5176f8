//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to be told
//! when a remote job moves through its stages or when an image assembly
//! encodes its pages. The host decides how to present them: the CLI draws a
//! spinner, a GUI would show a notice.
//!
//! # Example
//!
//! ```rust
//! use pdfconverter::{ConversionProgressCallback, ConverterConfig, JobPhase};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_phase(&self, job_id: &str, phase: JobPhase) {
//!         eprintln!("{job_id}: {phase}");
//!     }
//! }
//!
//! let config = ConverterConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::job::{JobPhase, JobStatus};
use crate::store::RecentFile;
use std::sync::Arc;

/// Called by the pipeline as work progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// The client-side state of a remote job changed.
    fn on_phase(&self, job_id: &str, phase: JobPhase) {
        let _ = (job_id, phase);
    }

    /// A status check completed.
    ///
    /// # Arguments
    /// * `attempt`      : 1-indexed attempt number
    /// * `max_attempts` : the configured poll budget
    /// * `status`       : status reported by the remote service
    fn on_poll(&self, job_id: &str, attempt: u32, max_attempts: u32, status: JobStatus) {
        let _ = (job_id, attempt, max_attempts, status);
    }

    /// The input file has been transferred to the upload target.
    fn on_upload_complete(&self, job_id: &str, bytes: u64) {
        let _ = (job_id, bytes);
    }

    /// The converted file has been downloaded to a temporary location.
    fn on_download_complete(&self, job_id: &str, filename: &str, bytes: u64) {
        let _ = (job_id, filename, bytes);
    }

    /// One image of an assembly has been read and encoded.
    ///
    /// May fire out of page order when images are encoded concurrently.
    fn on_image_encoded(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// A file has been saved into the artifact folder.
    fn on_saved(&self, file: &RecentFile) {
        let _ = file;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        phases: Mutex<Vec<JobPhase>>,
        polls: AtomicUsize,
        encoded: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_phase(&self, _job_id: &str, phase: JobPhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn on_poll(&self, _job_id: &str, _attempt: u32, _max: u32, _status: JobStatus) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_encoded(&self, _index: usize, _total: usize) {
            self.encoded.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_phase("job", JobPhase::Created);
        cb.on_poll("job", 1, 20, JobStatus::Processing);
        cb.on_upload_complete("job", 10);
        cb.on_download_complete("job", "out.docx", 10);
        cb.on_image_encoded(0, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_phase("job", JobPhase::Created);
        tracker.on_phase("job", JobPhase::Uploading);
        tracker.on_poll("job", 1, 3, JobStatus::Processing);
        tracker.on_poll("job", 2, 3, JobStatus::Finished);
        tracker.on_image_encoded(1, 2);

        assert_eq!(
            *tracker.phases.lock().unwrap(),
            vec![JobPhase::Created, JobPhase::Uploading]
        );
        assert_eq!(tracker.polls.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.encoded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_phase("job", JobPhase::Processing);
    }
}
