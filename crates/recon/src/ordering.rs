use crate::model::Individual;

impl Individual {
    /// Sort intakes and outcomes by timestamp. Stable: events sharing a
    /// timestamp keep their arrival order.
    pub fn order_events(&mut self) {
        self.intakes.sort_by_key(|intake| intake.timestamp);
        self.outcomes.sort_by_key(|outcome| outcome.timestamp);
    }
}
