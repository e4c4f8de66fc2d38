use std::time::Duration;

/// Display progress of the active story item.
///
/// Image and text items accumulate wall-clock ticks toward their duration.
/// Video items follow the media player: their percentage comes from the
/// reported playback position and they complete only on `media_ended`.
#[derive(Debug, Clone)]
pub struct Progress {
    duration_ms: u64,
    elapsed_ms: u64,
    paused: bool,
    media_driven: bool,
    media_ended: bool,
}

impl Progress {
    pub fn new(duration_secs: u32, is_video: bool) -> Self {
        Self {
            duration_ms: u64::from(duration_secs) * 1000,
            elapsed_ms: 0,
            paused: false,
            media_driven: is_video,
            media_ended: false,
        }
    }

    /// Accumulate `delta` of display time. Returns true once complete.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if !self.paused && !self.media_driven {
            let delta_ms = delta.as_millis() as u64;
            self.elapsed_ms = (self.elapsed_ms + delta_ms).min(self.duration_ms);
        }
        self.is_complete()
    }

    /// Follow the media player's position. Ignored for non-video items.
    pub fn sync_media(&mut self, position_ms: u64, length_ms: u64) {
        if !self.media_driven {
            return;
        }
        self.duration_ms = length_ms;
        self.elapsed_ms = position_ms.min(length_ms);
    }

    pub fn media_ended(&mut self) -> bool {
        if self.media_driven {
            self.media_ended = true;
            self.elapsed_ms = self.duration_ms;
        }
        self.is_complete()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_media_driven(&self) -> bool {
        self.media_driven
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn is_complete(&self) -> bool {
        if self.media_driven {
            self.media_ended
        } else {
            self.elapsed_ms >= self.duration_ms
        }
    }

    pub fn percent(&self) -> u8 {
        if self.duration_ms == 0 {
            return if self.is_complete() { 100 } else { 0 };
        }
        // Media positions are external input and may be near u64::MAX
        (u128::from(self.elapsed_ms) * 100 / u128::from(self.duration_ms)).min(100) as u8
    }
}
