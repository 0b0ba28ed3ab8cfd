// Invalidation state shared by the terrain and tree generators.
//
// Every parameter mutation goes through `mark_dirty`; the owner regenerates
// when it finds the state `Dirty`, bracketing the work with `begin`/`finish`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Dirty,
    Generating,
    Clean,
}

impl GenerationState {
    pub fn mark_dirty(&mut self) {
        *self = GenerationState::Dirty;
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, GenerationState::Dirty)
    }

    pub fn begin(&mut self) {
        *self = GenerationState::Generating;
    }

    pub fn finish(&mut self) {
        *self = GenerationState::Clean;
    }
}

#[cfg(test)]
mod tests {
    use super::GenerationState;

    #[test]
    fn lifecycle() {
        let mut state = GenerationState::default();
        assert!(state.is_dirty());

        state.begin();
        assert!(!state.is_dirty());
        state.finish();
        assert_eq!(state, GenerationState::Clean);

        state.mark_dirty();
        assert!(state.is_dirty());
    }
}
