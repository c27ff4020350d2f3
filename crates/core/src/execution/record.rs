use std::collections::HashSet;

/// Tasks completed during one logical run.
///
/// A record belongs to exactly one run. Reusing it for several top-level
/// targets is how a combined invocation shares prerequisites: anything already
/// done is not executed again.
#[derive(Debug, Default)]
pub struct ExecutionRecord {
    done: HashSet<String>,
    completed: Vec<String>,
}

impl ExecutionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self, name: &str) -> bool {
        self.done.contains(name)
    }

    pub fn mark_done(&mut self, name: &str) {
        if self.done.insert(name.to_string()) {
            self.completed.push(name.to_string());
        }
    }

    /// Completed tasks in completion order
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub(crate) fn done(&self) -> &HashSet<String> {
        &self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_done_once() {
        let mut record = ExecutionRecord::new();
        record.mark_done("clean");
        record.mark_done("env");
        record.mark_done("clean");

        assert!(record.is_done("clean"));
        assert!(!record.is_done("config"));
        assert_eq!(record.completed(), &["clean".to_string(), "env".to_string()]);
    }
}
