//! Event delivery between a rendering host and the engine.
//!
//! Events are queued and handled strictly one at a time. A host may
//! report a fragment write as an immediate `FragmentChanged`; the
//! follow-up load finds nothing to change and writes nothing, so the
//! exchange settles after one echo.

use std::collections::VecDeque;

use tracing::debug;

use crate::engine::ValueSyncEngine;
use crate::render::{DisplayMode, RowView};

/// A notification raised by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A numeric field was edited and now holds `text`.
    FieldEdited { row: usize, text: String },
    /// Bit box `bit` (0 = MSB) of `row` was clicked.
    BitClicked { row: usize, bit: usize },
    /// The display-mode control was clicked.
    DisplayToggled,
    /// The address-bar fragment changed to this text.
    FragmentChanged(String),
}

/// The rendering side: draws rows and owns the address bar.
pub trait Host {
    type Error;

    /// Draw one row.
    fn render_row(&mut self, row: &RowView) -> Result<(), Self::Error>;

    /// Replace the address-bar fragment.
    ///
    /// Return `true` when the fragment actually changed and the host wants
    /// a `FragmentChanged` delivered for it right away. Hosts whose change
    /// notification arrives later through their own event loop return
    /// `false` and dispatch it themselves.
    fn write_fragment(&mut self, fragment: &str) -> Result<bool, Self::Error>;

    /// Update the display-mode control.
    fn display_mode_changed(&mut self, _mode: DisplayMode) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// An engine wired to a host.
#[derive(Debug)]
pub struct Session<H> {
    engine: ValueSyncEngine,
    host: H,
    queue: VecDeque<Event>,
}

impl<H: Host> Session<H> {
    pub fn new(engine: ValueSyncEngine, host: H) -> Self {
        Session {
            engine,
            host,
            queue: VecDeque::new(),
        }
    }

    pub fn engine(&self) -> &ValueSyncEngine {
        &self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_parts(self) -> (ValueSyncEngine, H) {
        (self.engine, self.host)
    }

    /// Draw every row and the mode control, then apply the address bar's
    /// fragment if there is one.
    pub fn start(&mut self, initial_fragment: Option<&str>) -> Result<usize, H::Error> {
        self.render_all()?;
        self.host.display_mode_changed(self.engine.display_mode())?;
        match initial_fragment {
            Some(f) if !f.trim_start_matches('#').is_empty() => {
                self.dispatch(Event::FragmentChanged(f.to_string()))
            }
            _ => Ok(0),
        }
    }

    /// Queue `event` and run the queue dry. Returns how many events were
    /// handled, including echoes the host asked for.
    pub fn dispatch(&mut self, event: Event) -> Result<usize, H::Error> {
        self.queue.push_back(event);
        let mut handled = 0;
        while let Some(event) = self.queue.pop_front() {
            self.handle(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    fn handle(&mut self, event: Event) -> Result<(), H::Error> {
        debug!(?event, "handling event");
        match event {
            Event::FieldEdited { row, text } => {
                self.engine.set_value(row, text.as_str());
                self.after_edit(row)
            }
            Event::BitClicked { row, bit } => {
                // A valid flip always changes the value; `false` means the
                // click landed outside the register grid.
                if !self.engine.toggle_bit(row, bit) {
                    return Ok(());
                }
                self.after_edit(row)
            }
            Event::DisplayToggled => {
                let mode = self.engine.toggle_display_mode();
                self.host.display_mode_changed(mode)?;
                self.render_all()
            }
            Event::FragmentChanged(fragment) => {
                let changes = self.engine.load_from_fragment(&fragment);
                if changes.is_empty() {
                    return Ok(());
                }
                for &row in &changes {
                    self.render(row)?;
                }
                self.write_fragment()
            }
        }
    }

    /// A direct edit always re-serializes, even when the coerced value is
    /// unchanged; the host can tell whether the fragment moved.
    fn after_edit(&mut self, row: usize) -> Result<(), H::Error> {
        if row >= self.engine.len() {
            return Ok(());
        }
        self.render(row)?;
        self.write_fragment()
    }

    fn write_fragment(&mut self) -> Result<(), H::Error> {
        let fragment = self.engine.serialize_to_fragment();
        if self.host.write_fragment(&fragment)? {
            self.queue.push_back(Event::FragmentChanged(fragment));
        }
        Ok(())
    }

    fn render(&mut self, row: usize) -> Result<(), H::Error> {
        match self.engine.row_view(row) {
            Some(view) => self.host.render_row(&view),
            None => Ok(()),
        }
    }

    fn render_all(&mut self) -> Result<(), H::Error> {
        for view in self.engine.row_views() {
            self.host.render_row(&view)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    /// Behaves like an address bar that fires a change notification
    /// synchronously whenever its text actually changes.
    #[derive(Default)]
    struct EchoingHost {
        fragment: String,
        renders: Vec<(usize, u8)>,
        writes: Vec<String>,
        mode: Option<DisplayMode>,
    }

    impl Host for EchoingHost {
        type Error = Infallible;

        fn render_row(&mut self, row: &RowView) -> Result<(), Infallible> {
            self.renders.push((row.index, row.value));
            Ok(())
        }

        fn write_fragment(&mut self, fragment: &str) -> Result<bool, Infallible> {
            self.writes.push(fragment.to_string());
            let changed = self.fragment != fragment;
            self.fragment = fragment.to_string();
            Ok(changed)
        }

        fn display_mode_changed(&mut self, mode: DisplayMode) -> Result<(), Infallible> {
            self.mode = Some(mode);
            Ok(())
        }
    }

    fn session(values: &[u8]) -> Session<EchoingHost> {
        Session::new(
            ValueSyncEngine::with_values(values.len(), values),
            EchoingHost::default(),
        )
    }

    #[test]
    fn start_renders_every_row() {
        let mut s = session(&[5, 200]);
        assert_eq!(s.start(None).unwrap(), 0);
        assert_eq!(s.host().renders, vec![(0, 5), (1, 200)]);
        assert_eq!(s.host().mode, Some(DisplayMode::Pattern));
        assert!(s.host().writes.is_empty());
    }

    #[test]
    fn start_with_fragment_loads_it() {
        let mut s = session(&[0, 0]);
        s.start(Some("#5,200")).unwrap();
        assert_eq!(s.engine().values(), vec![5, 200]);
    }

    #[test]
    fn field_edit_writes_fragment_and_settles() {
        let mut s = session(&[5, 200]);
        let handled = s
            .dispatch(Event::FieldEdited {
                row: 0,
                text: "300".into(),
            })
            .unwrap();
        // The edit plus one echoed fragment change that applies nothing.
        assert_eq!(handled, 2);
        assert_eq!(s.engine().values(), vec![255, 200]);
        assert_eq!(s.host().fragment, "255,200");
        assert_eq!(s.host().writes, vec!["255,200".to_string()]);
    }

    #[test]
    fn bit_click_toggles_and_writes() {
        let mut s = session(&[5]);
        s.dispatch(Event::BitClicked { row: 0, bit: 0 }).unwrap();
        assert_eq!(s.engine().values(), vec![133]);
        assert_eq!(s.host().fragment, "133");
        assert_eq!(s.host().renders.last(), Some(&(0, 133)));
    }

    #[test]
    fn events_for_missing_rows_do_nothing() {
        let mut s = session(&[5]);
        s.dispatch(Event::BitClicked { row: 3, bit: 0 }).unwrap();
        s.dispatch(Event::FieldEdited {
            row: 3,
            text: "1".into(),
        })
        .unwrap();
        assert!(s.host().renders.is_empty());
        assert!(s.host().writes.is_empty());
    }

    #[test]
    fn bit_click_past_the_lsb_does_nothing() {
        let mut s = session(&[5]);
        assert_eq!(s.dispatch(Event::BitClicked { row: 0, bit: 8 }).unwrap(), 1);
        s.dispatch(Event::BitClicked { row: 0, bit: 9 }).unwrap();
        assert!(s.host().renders.is_empty());
        assert!(s.host().writes.is_empty());
        assert_eq!(s.engine().values(), vec![5]);
    }

    #[test]
    fn out_of_range_fragment_is_rewritten_canonically() {
        let mut s = session(&[0, 0]);
        let handled = s.dispatch(Event::FragmentChanged("300,abc".into())).unwrap();
        assert_eq!(handled, 2);
        assert_eq!(s.engine().values(), vec![255, 0]);
        assert_eq!(s.host().writes, vec!["255,0".to_string()]);
    }

    #[test]
    fn unchanged_fragment_writes_nothing() {
        let mut s = session(&[5, 200]);
        assert_eq!(s.dispatch(Event::FragmentChanged("5,200".into())).unwrap(), 1);
        assert!(s.host().writes.is_empty());
        assert!(s.host().renders.is_empty());
    }

    #[test]
    fn display_toggle_rerenders_without_touching_values() {
        let mut s = session(&[5, 200]);
        s.dispatch(Event::DisplayToggled).unwrap();
        assert_eq!(s.host().mode, Some(DisplayMode::Bits));
        assert_eq!(s.host().renders, vec![(0, 5), (1, 200)]);
        assert_eq!(s.engine().values(), vec![5, 200]);
        assert!(s.host().writes.is_empty());
    }
}
