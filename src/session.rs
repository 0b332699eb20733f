//! Calibration session controller
//!
//! Owns the capture state and runs the poll → acquire → save → render cycle.
//! All device access goes through the [`InputSource`], [`FrameSource`],
//! [`FrameStore`] and [`FrameSink`] traits, so the loop runs the same against
//! real hardware and against test doubles.

use std::path::{Path, PathBuf};

use crate::camera::FrameSource;
use crate::error::Result;
use crate::frame::Frame;
use crate::input::{Command, CommandMapper, InputSource, Motion};
use crate::preview::FrameSink;
use crate::store::FrameStore;

/// Snapshot of collection progress, shown in the preview overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub collected: u32,
    pub target: i64,
}

/// State of one image collection run.
#[derive(Debug)]
pub struct Session {
    target: i64,
    collected: u32,
    finished: bool,
    capture_requested: bool,
    motion: Motion,
    frame: Frame,
}

impl Session {
    /// Create a session collecting `target` images of `width`x`height`.
    ///
    /// A non-positive target yields a session that is already finished.
    pub fn new(target: i64, width: u32, height: u32) -> Self {
        Self {
            target,
            collected: 0,
            finished: target <= 0,
            capture_requested: false,
            motion: Motion::NEUTRAL,
            frame: Frame::blank(width, height),
        }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn capture_pending(&self) -> bool {
        self.capture_requested
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn progress(&self) -> Progress {
        Progress {
            collected: self.collected,
            target: self.target,
        }
    }

    /// Apply a single command.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Capture => self.capture_requested = true,
            Command::Move(motion) => {
                // No motion backend; record the intent and say so
                log::info!("{}", motion.placeholder_message());
                self.motion = motion;
            }
            Command::Stop => self.motion = Motion::NEUTRAL,
        }
    }

    /// Drain pending input and apply the mapped commands.
    pub fn poll_input(&mut self, input: &mut dyn InputSource, mapper: &dyn CommandMapper) {
        for event in input.poll_events() {
            match mapper.map(&event) {
                Some(command) => self.apply(command),
                None => log::trace!("Ignoring unmapped input {:?}", event),
            }
        }
    }

    /// Pull the latest frame into the session buffer.
    pub fn acquire_frame(&mut self, source: &mut dyn FrameSource) -> Result<()> {
        source.acquire(&mut self.frame)
    }

    /// Save the current frame if a capture was requested.
    ///
    /// The request is consumed whether or not a file is written. Returns the
    /// path of the written file, if any.
    pub fn maybe_save_frame(&mut self, store: &mut dyn FrameStore) -> Result<Option<PathBuf>> {
        let requested = std::mem::take(&mut self.capture_requested);

        let mut saved = None;
        if requested && i64::from(self.collected) < self.target {
            let path = store.save(&self.frame, self.collected)?;
            self.collected += 1;
            log::info!(
                "Collected {} of {} images for camera calibration.",
                self.collected,
                self.target
            );
            saved = Some(path);
        }

        if i64::from(self.collected) >= self.target {
            self.finished = true;
        }

        Ok(saved)
    }

    /// Present the current frame.
    pub fn render(&self, sink: &mut dyn FrameSink) -> Result<()> {
        sink.present(&self.frame, self.progress())
    }

    /// Run one loop iteration. Input is read before the frame is acquired, so
    /// a capture requested now saves the frame acquired now.
    pub fn step(
        &mut self,
        input: &mut dyn InputSource,
        mapper: &dyn CommandMapper,
        source: &mut dyn FrameSource,
        store: &mut dyn FrameStore,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        self.poll_input(input, mapper);
        self.acquire_frame(source)?;
        self.maybe_save_frame(store)?;
        self.render(sink)
    }

    /// Loop until the target count is reached, then log where the images went.
    pub fn run(
        &mut self,
        input: &mut dyn InputSource,
        mapper: &dyn CommandMapper,
        source: &mut dyn FrameSource,
        store: &mut dyn FrameStore,
        sink: &mut dyn FrameSink,
    ) -> Result<u32> {
        while !self.finished {
            self.step(input, mapper, source, store, sink)?;
        }
        self.log_completion(store.location());
        Ok(self.collected)
    }

    /// Completion banner.
    pub fn log_completion(&self, location: &Path) {
        log::info!("Finished image collection.");
        log::info!("Images saved at: {}", location.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaptureError;
    use crate::input::{InputEvent, Key, KeyboardMapper};
    use crate::store::PngDirectory;
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    const W: u32 = 8;
    const H: u32 = 6;

    /// Fills every pixel with the frame's sequence number.
    struct FakeCamera {
        produced: u8,
        limit: u8,
    }

    impl FakeCamera {
        fn new() -> Self {
            Self { produced: 0, limit: 100 }
        }
    }

    impl FrameSource for FakeCamera {
        fn acquire(&mut self, frame: &mut Frame) -> Result<()> {
            if self.produced >= self.limit {
                return Err(CaptureError::CameraFrame("fake camera exhausted".into()));
            }
            self.produced += 1;
            let value = self.produced;
            frame.fill_from_rgb(&RgbImage::from_pixel(W, H, Rgb([value, value, value])))
        }
    }

    /// One batch of events per iteration; empty once the script runs out.
    struct ScriptedInput {
        batches: VecDeque<Vec<InputEvent>>,
    }

    impl ScriptedInput {
        fn new(batches: Vec<Vec<InputEvent>>) -> Self {
            Self {
                batches: batches.into(),
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.batches.pop_front().unwrap_or_default()
        }
    }

    /// Records the first byte of each saved frame.
    #[derive(Default)]
    struct MemoryStore {
        saved: Vec<(u32, u8)>,
    }

    impl FrameStore for MemoryStore {
        fn save(&mut self, frame: &Frame, index: u32) -> Result<PathBuf> {
            self.saved.push((index, frame.as_bytes()[0]));
            Ok(PathBuf::from(format!("calib_{}.png", index)))
        }

        fn location(&self) -> &Path {
            Path::new("memory")
        }
    }

    struct FailingStore;

    impl FrameStore for FailingStore {
        fn save(&mut self, _frame: &Frame, index: u32) -> Result<PathBuf> {
            Err(CaptureError::Save {
                path: PathBuf::from(format!("calib_{}.png", index)),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )),
            })
        }

        fn location(&self) -> &Path {
            Path::new("nowhere")
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        presented: Vec<(u64, Progress)>,
    }

    impl FrameSink for RecordingSink {
        fn present(&mut self, frame: &Frame, progress: Progress) -> Result<()> {
            self.presented.push((frame.frame_number(), progress));
            Ok(())
        }
    }

    fn enter() -> Vec<InputEvent> {
        vec![InputEvent::KeyDown(Key::Enter), InputEvent::KeyUp(Key::Enter)]
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_new_session_state() {
        let session = Session::new(5, W, H);
        assert_eq!(session.collected(), 0);
        assert!(!session.is_finished());
        assert!(!session.capture_pending());
        assert_eq!(session.motion(), Motion::NEUTRAL);
        assert_eq!(session.frame().frame_number(), 0);
    }

    #[test]
    fn test_non_positive_target_is_already_finished() {
        for target in [0, -3] {
            let temp = tempfile::tempdir().unwrap();
            let mut store = PngDirectory::create(temp.path()).unwrap();
            let mut session = Session::new(target, W, H);
            assert!(session.is_finished());

            let mut camera = FakeCamera::new();
            let collected = session
                .run(
                    &mut ScriptedInput::new(vec![enter()]),
                    &KeyboardMapper,
                    &mut camera,
                    &mut store,
                    &mut RecordingSink::default(),
                )
                .unwrap();

            assert_eq!(collected, 0);
            assert_eq!(camera.produced, 0);
            assert!(files_in(temp.path()).is_empty());
        }
    }

    #[test]
    fn test_capture_flag_cleared_without_request() {
        let mut session = Session::new(2, W, H);
        let mut store = MemoryStore::default();

        assert_eq!(session.maybe_save_frame(&mut store).unwrap(), None);
        assert!(!session.capture_pending());
        assert!(store.saved.is_empty());
    }

    #[test]
    fn test_capture_flag_cleared_when_save_fails() {
        let mut session = Session::new(2, W, H);
        session.apply(Command::Capture);

        let err = session.maybe_save_frame(&mut FailingStore).unwrap_err();
        assert!(matches!(err, CaptureError::Save { .. }));
        assert!(!session.capture_pending());
        assert_eq!(session.collected(), 0);
        assert!(!session.is_finished());
    }

    #[test]
    fn test_double_trigger_saves_once() {
        let mut session = Session::new(5, W, H);
        let mut input = ScriptedInput::new(vec![vec![
            InputEvent::KeyDown(Key::Enter),
            InputEvent::KeyDown(Key::Enter),
        ]]);
        let mut store = MemoryStore::default();

        session
            .step(
                &mut input,
                &KeyboardMapper,
                &mut FakeCamera::new(),
                &mut store,
                &mut RecordingSink::default(),
            )
            .unwrap();

        assert_eq!(store.saved.len(), 1);
        assert_eq!(session.collected(), 1);

        // Applying the command twice directly is no different
        session.apply(Command::Capture);
        session.apply(Command::Capture);
        session.maybe_save_frame(&mut store).unwrap();
        assert_eq!(store.saved.len(), 2);
        assert!(!session.capture_pending());
    }

    #[test]
    fn test_saves_frame_acquired_in_same_iteration() {
        let mut session = Session::new(2, W, H);
        let mut input = ScriptedInput::new(vec![vec![], vec![], enter(), vec![], enter()]);
        let mut store = MemoryStore::default();
        let mut sink = RecordingSink::default();

        session
            .run(&mut input, &KeyboardMapper, &mut FakeCamera::new(), &mut store, &mut sink)
            .unwrap();

        assert_eq!(store.saved, vec![(0, 3), (1, 5)]);
        assert_eq!(sink.presented.len(), 5);
        assert_eq!(sink.presented.last().unwrap().0, 5);
    }

    #[test]
    fn test_counter_never_exceeds_target() {
        let mut session = Session::new(2, W, H);
        let mut input = ScriptedInput::new(vec![enter(); 6]);
        let mut store = MemoryStore::default();
        let mut sink = RecordingSink::default();

        session
            .run(&mut input, &KeyboardMapper, &mut FakeCamera::new(), &mut store, &mut sink)
            .unwrap();

        assert!(sink
            .presented
            .iter()
            .all(|(_, progress)| i64::from(progress.collected) <= progress.target));
        assert_eq!(session.collected(), 2);

        // Further requests after finishing write nothing
        session.apply(Command::Capture);
        assert_eq!(session.maybe_save_frame(&mut store).unwrap(), None);
        assert_eq!(store.saved.len(), 2);
        assert_eq!(session.collected(), 2);
    }

    #[test]
    fn test_motion_keys_have_no_effect_on_capture() {
        let mut session = Session::new(3, W, H);
        let mut input = ScriptedInput::new(vec![vec![
            InputEvent::KeyDown(Key::Up),
            InputEvent::KeyDown(Key::Left),
        ]]);

        session.poll_input(&mut input, &KeyboardMapper);
        assert_eq!(session.motion(), Motion::TURN_LEFT);
        assert!(!session.capture_pending());

        let mut input = ScriptedInput::new(vec![vec![InputEvent::KeyUp(Key::Left)]]);
        session.poll_input(&mut input, &KeyboardMapper);
        assert_eq!(session.motion(), Motion::NEUTRAL);

        session.apply(Command::Move(Motion::BACKWARD));
        session.apply(Command::Stop);
        assert_eq!(session.motion(), Motion::NEUTRAL);
    }

    #[test]
    fn test_camera_error_is_fatal() {
        let mut session = Session::new(3, W, H);
        let mut camera = FakeCamera { produced: 0, limit: 2 };

        let err = session
            .run(
                &mut ScriptedInput::new(vec![]),
                &KeyboardMapper,
                &mut camera,
                &mut MemoryStore::default(),
                &mut RecordingSink::default(),
            )
            .unwrap_err();

        assert!(matches!(err, CaptureError::CameraFrame(_)));
        assert!(!session.is_finished());
    }

    #[test]
    fn test_three_image_run_writes_numbered_files() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("calib_pics");
        let mut store = PngDirectory::create(&dir).unwrap();
        let mut session = Session::new(3, W, H);
        let mut input = ScriptedInput::new(vec![
            vec![],
            enter(),
            vec![InputEvent::KeyDown(Key::Right)],
            enter(),
            vec![],
            enter(),
        ]);

        let collected = session
            .run(
                &mut input,
                &KeyboardMapper,
                &mut FakeCamera::new(),
                &mut store,
                &mut RecordingSink::default(),
            )
            .unwrap();

        assert_eq!(collected, 3);
        assert!(session.is_finished());
        assert_eq!(files_in(&dir), vec!["calib_0.png", "calib_1.png", "calib_2.png"]);

        // Iterations 2, 4 and 6 were captured
        let first = image::open(dir.join("calib_0.png")).unwrap().to_rgb8();
        let last = image::open(dir.join("calib_2.png")).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(0, 0), &Rgb([2, 2, 2]));
        assert_eq!(last.get_pixel(0, 0), &Rgb([6, 6, 6]));
    }

    #[test]
    fn test_rerun_restarts_numbering_and_keeps_other_files() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("calib_pics");

        for _ in 0..2 {
            let mut store = PngDirectory::create(&dir).unwrap();
            let mut session = Session::new(2, W, H);
            session
                .run(
                    &mut ScriptedInput::new(vec![enter(), enter()]),
                    &KeyboardMapper,
                    &mut FakeCamera::new(),
                    &mut store,
                    &mut RecordingSink::default(),
                )
                .unwrap();
            std::fs::write(dir.join("notes.txt"), b"keep").unwrap();
        }

        assert_eq!(files_in(&dir), vec!["calib_0.png", "calib_1.png", "notes.txt"]);
    }
}
