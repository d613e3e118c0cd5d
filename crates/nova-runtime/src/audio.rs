use crate::types::AUDIO_STAGE_CAPACITY;

/// Destination of flushed audio, typically the managed audio track.
///
/// Flushes run on the emulation thread, either mid-`retro_run` when the stage
/// reaches its threshold or after the frame for the residue.
pub trait AudioSink: Send + Sync {
    /// Prepares the calling thread for [`write`](Self::write). The emulation
    /// thread calls this once before its first frame.
    fn attach_current_thread(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Delivers interleaved stereo samples. Failures are the sink's to swallow.
    fn write(&self, samples: &[i16]);
}

/// Fixed-capacity staging buffer between the core's audio callbacks and the
/// sink. Never flushes by itself: [`push`](Self::push) hands back full chunks
/// so the caller can release its lock before delivering them.
pub struct AudioStage {
    samples: Box<[i16]>,
    cursor: usize,
    threshold: usize,
}

impl AudioStage {
    pub fn new(threshold: usize) -> Self {
        Self {
            samples: vec![0; AUDIO_STAGE_CAPACITY].into_boxed_slice(),
            cursor: 0,
            threshold: threshold.clamp(1, AUDIO_STAGE_CAPACITY),
        }
    }

    /// Appends interleaved samples. Every time the cursor reaches the
    /// threshold the staged prefix is snapshotted and the cursor rewinds.
    pub fn push(&mut self, mut input: &[i16]) -> Vec<Vec<i16>> {
        let mut ready = Vec::new();
        while !input.is_empty() {
            let take = input.len().min(self.threshold - self.cursor);
            let (head, tail) = input.split_at(take);
            self.samples[self.cursor..self.cursor + take].copy_from_slice(head);
            self.cursor += take;
            input = tail;

            if self.cursor >= self.threshold {
                ready.push(self.samples[..self.cursor].to_vec());
                self.cursor = 0;
            }
        }
        ready
    }

    /// Takes whatever is staged, leaving the stage empty.
    pub fn drain_residual(&mut self) -> Option<Vec<i16>> {
        if self.cursor == 0 {
            return None;
        }
        let residual = self.samples[..self.cursor].to_vec();
        self.cursor = 0;
        Some(residual)
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}
