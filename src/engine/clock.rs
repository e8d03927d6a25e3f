// 6.3 engine/clock.rs: advances simulated time. collects the stored ticks in
// the elapsed window, sorts them, and drives the matching engine tick by
// tick. deterministic: replaying the same stored ticks from the same state
// yields the identical side-effect sequence.

use super::core::Engine;
use super::results::EngineError;
use crate::tick::Tick;

impl Engine {
    /// Advance the simulated clock by `duration_secs`, processing every stored
    /// tick whose timestamp lands in `(local_date, local_date + duration]`.
    ///
    /// Collection iterates symbols in registration order, then tick order; the
    /// sort is stable, so ticks sharing a timestamp keep that collection
    /// order. Each tick sets the local date and the last-tick cache before the
    /// matching engine runs. On error the local date stays at the last
    /// successfully processed tick and the remaining window is abandoned.
    ///
    /// Returns the applied ticks in processing order. The local date ends at
    /// the window end even when no tick matched.
    pub fn advance(&mut self, duration_secs: i64) -> Result<Vec<Tick>, EngineError> {
        if duration_secs < 0 {
            return Err(EngineError::InvalidArgument(
                "advance duration must be non-negative".to_string(),
            ));
        }

        let previous = self.account.local_date();
        let to = previous.plus_seconds(duration_secs);

        let mut window: Vec<Tick> = Vec::new();
        for symbol in self.ticks.symbols() {
            for tick in self.ticks.ticks(symbol.as_str())? {
                if tick.timestamp > previous && tick.timestamp <= to {
                    window.push(tick.clone());
                }
            }
        }
        window.sort_by_key(|tick| tick.timestamp);

        for tick in &window {
            self.account.set_local_date(tick.timestamp);
            self.ticks.apply_tick(tick.clone());
            self.on_tick(tick)?;
        }

        self.account.set_local_date(to);
        Ok(window)
    }
}
