//! State Machine Runtime
//!
//! Flat, typed state machines driven by discrete events. States and events
//! are small `Copy` enums supplied by the caller; the machine only stores
//! the transition table and the current state. Side effects live with the
//! owner, which inspects the `(from, to)` pair returned by [`StateMachine::send`].

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Number of transitions kept for debugging
const HISTORY_LIMIT: usize = 32;

/// A transition in the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<S, E> {
    pub from_state: S,
    pub event: E,
    pub to_state: S,
}

impl<S, E> Transition<S, E> {
    pub fn new(from: S, event: E, to: S) -> Self {
        Self {
            from_state: from,
            event,
            to_state: to,
        }
    }
}

/// Builder for creating state machines
pub struct StateMachineBuilder<S, E> {
    initial_state: S,
    transitions: Vec<Transition<S, E>>,
}

impl<S, E> StateMachineBuilder<S, E>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Hash + Debug,
{
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: Vec::new(),
        }
    }

    /// Add a transition
    pub fn transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add a simple transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.push(Transition::new(from, event, to));
        self
    }

    /// Build the state machine
    pub fn build(self) -> StateMachine<S, E> {
        StateMachine::new(self.initial_state, self.transitions)
    }
}

/// A state machine instance
#[derive(Clone, Debug)]
pub struct StateMachine<S, E> {
    current_state: S,
    table: FxHashMap<(S, E), S>,
    /// Most recent transitions, oldest first
    history: VecDeque<(S, E, S)>,
}

impl<S, E> StateMachine<S, E>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Hash + Debug,
{
    /// Create a new state machine with an initial state and transitions.
    ///
    /// A later transition for the same `(from, event)` pair replaces an earlier one.
    pub fn new(initial_state: S, transitions: Vec<Transition<S, E>>) -> Self {
        let mut table = FxHashMap::default();
        for t in transitions {
            table.insert((t.from_state, t.event), t.to_state);
        }
        Self {
            current_state: initial_state,
            table,
            history: VecDeque::new(),
        }
    }

    /// Create a builder for a state machine
    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    /// Get the current state
    pub fn current_state(&self) -> S {
        self.current_state
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    /// Recent transition history
    pub fn history(&self) -> impl Iterator<Item = &(S, E, S)> {
        self.history.iter()
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Check if an event can trigger a transition from current state
    pub fn can_send(&self, event: E) -> bool {
        self.table.contains_key(&(self.current_state, event))
    }

    /// Send an event, returning `(from, to)` if a transition happened
    pub fn send(&mut self, event: E) -> Option<(S, S)> {
        let from = self.current_state;
        let to = *self.table.get(&(from, event))?;

        self.current_state = to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back((from, event, to));
        tracing::trace!("fsm {:?} --{:?}--> {:?}", from, event, to);

        Some((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum State {
        Idle,
        Hovered,
        Pressed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Event {
        PointerEnter,
        PointerLeave,
        PointerDown,
        PointerUp,
    }

    #[test]
    fn test_simple_transitions() {
        let mut fsm = StateMachine::new(
            State::Idle,
            vec![
                Transition::new(State::Idle, Event::PointerEnter, State::Hovered),
                Transition::new(State::Hovered, Event::PointerLeave, State::Idle),
                Transition::new(State::Hovered, Event::PointerDown, State::Pressed),
                Transition::new(State::Pressed, Event::PointerUp, State::Hovered),
            ],
        );

        assert_eq!(fsm.current_state(), State::Idle);

        assert_eq!(
            fsm.send(Event::PointerEnter),
            Some((State::Idle, State::Hovered))
        );
        fsm.send(Event::PointerDown);
        assert_eq!(fsm.current_state(), State::Pressed);

        fsm.send(Event::PointerUp);
        assert!(fsm.is_in(State::Hovered));

        fsm.send(Event::PointerLeave);
        assert_eq!(fsm.current_state(), State::Idle);
    }

    #[test]
    fn test_invalid_event_no_transition() {
        let mut fsm = StateMachine::builder(State::Idle)
            .on(State::Idle, Event::PointerEnter, State::Hovered)
            .build();

        assert_eq!(fsm.send(Event::PointerDown), None);
        assert_eq!(fsm.current_state(), State::Idle);
    }

    #[test]
    fn test_can_send() {
        let fsm = StateMachine::builder(State::Idle)
            .on(State::Idle, Event::PointerEnter, State::Hovered)
            .build();

        assert!(fsm.can_send(Event::PointerEnter));
        assert!(!fsm.can_send(Event::PointerDown));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut fsm = StateMachine::builder(State::Idle)
            .on(State::Idle, Event::PointerEnter, State::Hovered)
            .on(State::Hovered, Event::PointerLeave, State::Idle)
            .build();

        for _ in 0..HISTORY_LIMIT {
            fsm.send(Event::PointerEnter);
            fsm.send(Event::PointerLeave);
        }

        assert_eq!(fsm.history().count(), HISTORY_LIMIT);
        assert_eq!(
            fsm.history().last(),
            Some(&(State::Hovered, Event::PointerLeave, State::Idle))
        );

        fsm.clear_history();
        assert_eq!(fsm.history().count(), 0);
    }
}
