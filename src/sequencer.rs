/*
 *  sequencer.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display sequencer - refreshes a display and paces its screens
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{info, warn};
use std::future::Future;
use std::time::Duration;

use crate::display::{DisplayStatus, SequencedDisplay, SlideFill};

/// Where rendered frames end up
pub trait Canvas<F> {
    fn draw(&mut self, index: usize, total: usize, frame: &F);
}

/// Writes each slide to the log, for headless runs
#[derive(Debug, Default)]
pub struct LogCanvas {
    drawn: usize,
}

impl LogCanvas {
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl Canvas<SlideFill> for LogCanvas {
    fn draw(&mut self, index: usize, total: usize, frame: &SlideFill) {
        self.drawn += 1;
        info!("[{}/{}] {} <{}>", index + 1, total, frame.caption, frame.photo.src);
    }
}

/// Outcome of one pass over a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub status: DisplayStatus,
    pub screens: usize,
    pub drawn: usize,
}

pub struct Sequencer<D, C> {
    display: D,
    canvas: C,
    /// wait between passes that showed nothing
    idle: Duration,
}

impl<D, C> Sequencer<D, C>
where
    D: SequencedDisplay,
    C: Canvas<D::Frame>,
{
    pub fn new(display: D, canvas: C) -> Self {
        let idle = display.timing().screen_duration();
        Self { display, canvas, idle }
    }

    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// Refresh the display, then show each of its screens for its duration.
    pub async fn run_pass(&mut self, refresh: bool) -> PassSummary {
        self.display.fetch_data(refresh).await;

        let status = self.display.status();
        let screens = if status == DisplayStatus::Loaded {
            self.display.timing().total_screens
        } else {
            0
        };
        let pace = self.display.timing().screen_duration();

        let mut drawn = 0;
        for index in 0..screens {
            if let Some(frame) = self.display.render(index) {
                self.canvas.draw(index, screens, &frame);
                drawn += 1;
            }
            tokio::time::sleep(pace).await;
        }

        PassSummary { status, screens, drawn }
    }

    /// Loop passes until `shutdown` resolves.
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                summary = self.run_pass(false) => {
                    if summary.drawn == 0 {
                        match summary.status {
                            DisplayStatus::Failed => warn!("{}: failed, retrying later", self.display.name()),
                            status => info!("{}: nothing to show ({:?})", self.display.name(), status),
                        }
                        tokio::select! {
                            _ = tokio::time::sleep(self.idle) => {}
                            _ = &mut shutdown => break,
                        }
                    }
                }
                _ = &mut shutdown => break,
            }
        }
        info!("{}: sequencer stopped", self.display.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Timing;

    /// Display with fixed screens, some of which have nothing to draw
    struct Fixed {
        frames: Vec<Option<&'static str>>,
        status: DisplayStatus,
        timing: Timing,
        fetches: usize,
    }

    impl Fixed {
        fn new(frames: Vec<Option<&'static str>>, status: DisplayStatus) -> Self {
            Self {
                timing: Timing {
                    total_screens: frames.len(),
                    delay: 1,
                    base_delay: Duration::from_millis(1),
                },
                frames,
                status,
                fetches: 0,
            }
        }
    }

    impl SequencedDisplay for Fixed {
        type Frame = &'static str;

        fn name(&self) -> &str {
            "fixed"
        }
        fn is_enabled(&self) -> bool {
            true
        }
        fn status(&self) -> DisplayStatus {
            self.status
        }
        fn timing(&self) -> &Timing {
            &self.timing
        }
        async fn fetch_data(&mut self, _refresh: bool) {
            self.fetches += 1;
        }
        fn render(&mut self, index: usize) -> Option<&'static str> {
            self.frames.get(index).copied().flatten()
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<(usize, usize, &'static str)>);

    impl Canvas<&'static str> for Recorder {
        fn draw(&mut self, index: usize, total: usize, frame: &&'static str) {
            self.0.push((index, total, *frame));
        }
    }

    #[tokio::test]
    async fn test_pass_draws_each_screen() {
        let display = Fixed::new(vec![Some("a"), None, Some("c")], DisplayStatus::Loaded);
        let mut seq = Sequencer::new(display, Recorder::default());
        let summary = seq.run_pass(false).await;

        assert_eq!(summary, PassSummary { status: DisplayStatus::Loaded, screens: 3, drawn: 2 });
        assert_eq!(seq.canvas().0, vec![(0, 3, "a"), (2, 3, "c")]);
        assert_eq!(seq.display().fetches, 1);
    }

    #[tokio::test]
    async fn test_pass_skips_unloaded_display() {
        let display = Fixed::new(vec![Some("a")], DisplayStatus::NoData);
        let mut seq = Sequencer::new(display, Recorder::default());
        let summary = seq.run_pass(true).await;
        assert_eq!(summary.screens, 0);
        assert!(seq.canvas().0.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let display = Fixed::new(vec![Some("a")], DisplayStatus::Failed);
        let mut seq = Sequencer::new(display, Recorder::default()).with_idle(Duration::from_millis(5));
        seq.run(tokio::time::sleep(Duration::from_millis(30))).await;
        assert!(seq.display().fetches >= 1);
    }

    #[test]
    fn test_log_canvas_counts() {
        let mut canvas = LogCanvas::default();
        let fill = SlideFill::for_photo(&crate::photo::Photo::new("a.jpg", "http://x/a.jpg"));
        canvas.draw(0, 1, &fill);
        assert_eq!(canvas.drawn(), 1);
    }
}
