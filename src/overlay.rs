use std::time::Duration;

const PUBLISH_INTERVAL: Duration = Duration::from_millis(500);

/// Frame timing shown in the window title.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    pub milliseconds_per_frame: f64,
    pub frames_per_second: f64,
}

impl FrameSummary {
    pub fn title(&self, base_title: &str) -> String {
        format!(
            "{base_title} | {:.3} ms/frame ({:.1} FPS)",
            self.milliseconds_per_frame, self.frames_per_second
        )
    }
}

/// Averages frame times and publishes a summary twice per second.
#[derive(Debug, Default)]
pub struct FrameStats {
    elapsed: Duration,
    frame_count: u32,
}

impl FrameStats {
    pub fn record_frame(&mut self, delta_time: Duration) -> Option<FrameSummary> {
        self.elapsed += delta_time;
        self.frame_count += 1;

        if self.elapsed < PUBLISH_INTERVAL {
            return None;
        }

        let seconds = self.elapsed.as_secs_f64();
        let frames = self.frame_count as f64;
        let summary = FrameSummary {
            milliseconds_per_frame: seconds * 1000.0 / frames,
            frames_per_second: frames / seconds,
        };

        self.elapsed = Duration::ZERO;
        self.frame_count = 0;

        Some(summary)
    }
}
