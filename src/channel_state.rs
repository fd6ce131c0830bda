//! Last emitted output per channel.

/// The last output value of every channel observed so far.
///
/// Entries are created the first time a channel index is seen and are never
/// removed: a tick that carries fewer channels than a previous one leaves the
/// missing channels untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    last_outputs: Vec<Option<f32>>,
}

impl ChannelState {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last output of `channel`, or `None` if it was never
    /// observed.
    #[inline]
    #[must_use]
    pub fn get(&self, channel: usize) -> Option<f32> {
        self.last_outputs.get(channel).copied().flatten()
    }

    /// Stores `value` as the last output of `channel`, creating the entry if
    /// needed.
    #[inline]
    pub fn set(&mut self, channel: usize, value: f32) {
        if channel >= self.last_outputs.len() {
            self.last_outputs.resize(channel + 1, None);
        }
        self.last_outputs[channel] = Some(value);
    }

    /// Number of observed channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_outputs.iter().filter(|value| value.is_some()).count()
    }

    /// Returns `true` if no channel has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_outputs.iter().all(Option::is_none)
    }

    /// Iterates over observed channels as `(index, last_output)`, in index
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.last_outputs
            .iter()
            .enumerate()
            .filter_map(|(channel, value)| value.map(|value| (channel, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unobserved_channels_are_absent() {
        let state = ChannelState::new();
        assert!(state.is_empty());
        assert_eq!(state.get(0), None);
        assert_eq!(state.get(42), None);
    }

    #[test]
    fn set_creates_and_overwrites() {
        let mut state = ChannelState::new();
        state.set(0, 1.0);
        state.set(0, 2.0);
        assert_eq!(state.get(0), Some(2.0));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn sparse_set_leaves_gap_unobserved() {
        let mut state = ChannelState::new();
        state.set(3, 7.5);
        assert_eq!(state.get(3), Some(7.5));
        assert_eq!(state.get(1), None);
        assert_eq!(state.len(), 1);
        assert_eq!(state.iter().collect::<Vec<_>>(), vec![(3, 7.5)]);
    }

    #[test]
    fn iter_is_in_index_order() {
        let mut state = ChannelState::new();
        state.set(2, 20.0);
        state.set(0, 0.0);
        state.set(1, 10.0);
        assert_eq!(
            state.iter().collect::<Vec<_>>(),
            vec![(0, 0.0), (1, 10.0), (2, 20.0)]
        );
    }
}
