//! In-memory task store shared through the application state.

use std::cell::{Cell, RefCell};

use anyhow::{bail, Result};
use cmdtree::OutputFormat;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub done: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RefCell<Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding a few tasks, so a fresh binary has something to show.
    pub fn with_samples() -> Self {
        let store = Self::new();
        store.add("Write the release notes", &["docs".into()]);
        store.add("Fix flaky upload test", &["ci".into(), "bug".into()]);
        store.add("Book flights", &[]);
        store
    }

    pub fn add(&self, title: &str, tags: &[String]) -> Task {
        let mut tasks = self.tasks.borrow_mut();
        let id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
        let task = Task {
            id,
            title: title.to_string(),
            done: false,
            tags: tags.to_vec(),
        };
        tasks.push(task.clone());
        task
    }

    pub fn list(&self, include_done: bool) -> Vec<Task> {
        self.tasks
            .borrow()
            .iter()
            .filter(|task| include_done || !task.done)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u32) -> Result<Task> {
        match self.tasks.borrow().iter().find(|task| task.id == id) {
            Some(task) => Ok(task.clone()),
            None => bail!("no task with id {id}"),
        }
    }

    /// Applies `edit` to task `id` and returns the updated task.
    pub fn update(&self, id: u32, edit: impl FnOnce(&mut Task)) -> Result<Task> {
        let mut tasks = self.tasks.borrow_mut();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            bail!("no task with id {id}");
        };
        edit(task);
        Ok(task.clone())
    }

    /// Every tag in use with the number of tasks carrying it, sorted by tag.
    pub fn tags(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for tag in self.tasks.borrow().iter().flat_map(|task| task.tags.iter()) {
            match counts.iter_mut().find(|(name, _)| name == tag) {
                Some((_, count)) => *count += 1,
                None => counts.push((tag.clone(), 1)),
            }
        }
        counts.sort();
        counts
    }

    /// Renames a tag on every task. Returns the number of tasks touched.
    pub fn rename_tag(&self, old: &str, new: &str) -> usize {
        let mut touched = 0;
        for task in self.tasks.borrow_mut().iter_mut() {
            let mut changed = false;
            for tag in task.tags.iter_mut().filter(|tag| *tag == old) {
                *tag = new.to_string();
                changed = true;
            }
            if changed {
                task.tags.dedup();
                touched += 1;
            }
        }
        touched
    }
}

/// Settings picked up from the root flags during dispatch.
#[derive(Debug, Default)]
pub struct Settings {
    pub format: Cell<OutputFormat>,
}
