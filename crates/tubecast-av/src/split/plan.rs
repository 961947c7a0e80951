//! Size-proportional segment planning.

/// One contiguous time range of the source, `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// 0-based position in the plan.
    pub index: usize,
    /// Start offset in seconds.
    pub start: f64,
    /// Length in seconds.
    pub length: f64,
    /// Whether this is the final segment, which runs to end of stream.
    pub is_last: bool,
}

impl Segment {
    /// End offset in seconds (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    /// 1-based part number used in file names and captions.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// An ordered set of segments covering `[0, duration)` exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    segments: Vec<Segment>,
    part_duration: f64,
}

impl SegmentPlan {
    /// Plan a split of a file of `size` bytes and `duration` seconds so that
    /// each part is estimated to fit under `ceiling` bytes.
    ///
    /// The part count is `size / ceiling + 1`, a linear extrapolation from the
    /// average bitrate. A file of `ceiling + 1` bytes gets two parts, and one of
    /// exactly `2 * ceiling` bytes gets three. Every part spans the same length
    /// except the last, which ends exactly at `duration`.
    ///
    /// # Panics
    ///
    /// Panics if `ceiling` is zero.
    pub fn new(size: u64, ceiling: u64, duration: f64) -> Self {
        assert!(ceiling > 0, "size ceiling must be positive");

        let count = part_count(size, ceiling);
        let part_duration = duration / count as f64;

        let segments = (0..count)
            .map(|index| {
                let start = index as f64 * part_duration;
                let is_last = index + 1 == count;
                let length = if is_last {
                    duration - (count - 1) as f64 * part_duration
                } else {
                    part_duration
                };
                Segment {
                    index,
                    start,
                    length,
                    is_last,
                }
            })
            .collect();

        Self {
            segments,
            part_duration,
        }
    }

    /// Uniform length of every non-final segment.
    pub fn part_duration(&self) -> f64 {
        self.part_duration
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Number of parts a file of `size` bytes needs under `ceiling`.
pub fn part_count(size: u64, ceiling: u64) -> usize {
    (size / ceiling + 1) as usize
}
