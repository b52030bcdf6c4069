//! # Principal Selector
//!
//! Three independent dual listboxes (profile, permission sets, permission set
//! groups), each backed by a deduplicated option list from the read-only
//! principal catalog. Every selection call replaces the axis' selection and
//! publishes the resulting [`PrincipalSelection`]. Subscribers only ever see
//! the latest change; intermediate selections are overwritten.
//!
//! Selecting does not cancel or start runs; whoever drives the orchestrator
//! decides that, typically by subscribing to [`PrincipalSelector::subscribe`].

use permval_core::{
    AccessCheckError, PrincipalCatalog, PrincipalId, PrincipalOption, PrincipalSelection,
    SelectionAxis, SelectionError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tokio::sync::watch;

/// Published after every selection call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChanged {
    /// Axis that was replaced
    pub axis: SelectionAxis,
    /// Full selection after the change
    pub selection: PrincipalSelection,
}

/// Available/selected lists for one axis
#[derive(Debug, Clone)]
pub struct DualListbox {
    axis: SelectionAxis,
    options: Vec<PrincipalOption>,
    selected: BTreeSet<PrincipalId>,
}

impl DualListbox {
    /// Empty listbox for an axis
    pub fn new(axis: SelectionAxis) -> Self {
        Self {
            axis,
            options: Vec::new(),
            selected: BTreeSet::new(),
        }
    }

    /// Axis this listbox serves
    pub fn axis(&self) -> SelectionAxis {
        self.axis
    }

    /// Replace the options, keeping the first occurrence of each id.
    ///
    /// Selected ids no longer offered are dropped.
    pub fn set_options(&mut self, options: Vec<PrincipalOption>) {
        let mut seen = HashSet::with_capacity(options.len());
        self.options = options
            .into_iter()
            .filter(|option| seen.insert(option.id.clone()))
            .collect();
        let offered: HashSet<&PrincipalId> = self.options.iter().map(|option| &option.id).collect();
        self.selected.retain(|id| offered.contains(id));
    }

    /// Every option, in catalog order
    pub fn options(&self) -> &[PrincipalOption] {
        &self.options
    }

    /// Options not selected, in catalog order
    pub fn available(&self) -> Vec<&PrincipalOption> {
        self.options
            .iter()
            .filter(|option| !self.selected.contains(&option.id))
            .collect()
    }

    /// Selected options, in catalog order
    pub fn selected(&self) -> Vec<&PrincipalOption> {
        self.options
            .iter()
            .filter(|option| self.selected.contains(&option.id))
            .collect()
    }

    /// Selected ids
    pub fn selected_ids(&self) -> &BTreeSet<PrincipalId> {
        &self.selected
    }

    /// Replace the selection; every id must be offered
    pub fn select<I>(&mut self, ids: I) -> Result<(), SelectionError>
    where
        I: IntoIterator<Item = PrincipalId>,
    {
        let ids: BTreeSet<PrincipalId> = ids.into_iter().collect();
        if let Some(unknown) = ids
            .iter()
            .find(|id| !self.options.iter().any(|option| &option.id == *id))
        {
            return Err(SelectionError::UnknownPrincipal {
                axis: self.axis,
                id: unknown.clone(),
            });
        }
        self.selected = ids;
        Ok(())
    }
}

/// Axes whose catalog failed to load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Failures by axis
    pub failures: Vec<(SelectionAxis, AccessCheckError)>,
}

impl LoadReport {
    /// Whether every axis loaded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The three selection axes
#[derive(Debug)]
pub struct PrincipalSelector {
    profiles: DualListbox,
    permission_sets: DualListbox,
    permission_set_groups: DualListbox,
    changes: watch::Sender<Option<SelectionChanged>>,
}

impl PrincipalSelector {
    /// Selector with nothing loaded or selected
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            profiles: DualListbox::new(SelectionAxis::Profile),
            permission_sets: DualListbox::new(SelectionAxis::PermissionSet),
            permission_set_groups: DualListbox::new(SelectionAxis::PermissionSetGroup),
            changes,
        }
    }

    /// Load all three axes from the catalog.
    ///
    /// A failed axis is left without options; the others still load.
    pub async fn load(&mut self, catalog: &dyn PrincipalCatalog) -> LoadReport {
        let (profiles, permission_sets, permission_set_groups) = tokio::join!(
            catalog.list_profiles(),
            catalog.list_permission_sets(),
            catalog.list_permission_set_groups(),
        );

        let mut report = LoadReport::default();
        for (axis, loaded) in [
            (SelectionAxis::Profile, profiles),
            (SelectionAxis::PermissionSet, permission_sets),
            (SelectionAxis::PermissionSetGroup, permission_set_groups),
        ] {
            match loaded {
                Ok(options) => {
                    tracing::debug!(%axis, options = options.len(), "principal options loaded");
                    self.listbox_mut(axis).set_options(options);
                }
                Err(error) => {
                    tracing::warn!(%axis, %error, "principal options failed to load");
                    self.listbox_mut(axis).set_options(Vec::new());
                    report.failures.push((axis, error));
                }
            }
        }
        report
    }

    /// Listbox for an axis
    pub fn listbox(&self, axis: SelectionAxis) -> &DualListbox {
        match axis {
            SelectionAxis::Profile => &self.profiles,
            SelectionAxis::PermissionSet => &self.permission_sets,
            SelectionAxis::PermissionSetGroup => &self.permission_set_groups,
        }
    }

    fn listbox_mut(&mut self, axis: SelectionAxis) -> &mut DualListbox {
        match axis {
            SelectionAxis::Profile => &mut self.profiles,
            SelectionAxis::PermissionSet => &mut self.permission_sets,
            SelectionAxis::PermissionSetGroup => &mut self.permission_set_groups,
        }
    }

    /// Select one profile, or none
    pub fn select_profile(
        &mut self,
        profile_id: Option<PrincipalId>,
    ) -> Result<SelectionChanged, SelectionError> {
        self.replace(SelectionAxis::Profile, profile_id)
    }

    /// Replace the selected permission sets
    pub fn select_permission_sets(
        &mut self,
        ids: BTreeSet<PrincipalId>,
    ) -> Result<SelectionChanged, SelectionError> {
        self.replace(SelectionAxis::PermissionSet, ids)
    }

    /// Replace the selected permission set groups
    pub fn select_permission_set_groups(
        &mut self,
        ids: BTreeSet<PrincipalId>,
    ) -> Result<SelectionChanged, SelectionError> {
        self.replace(SelectionAxis::PermissionSetGroup, ids)
    }

    /// Current selection across all axes
    pub fn selection(&self) -> PrincipalSelection {
        PrincipalSelection {
            profile_id: self.profiles.selected_ids().iter().next().cloned(),
            permission_set_ids: self.permission_sets.selected_ids().clone(),
            permission_set_group_ids: self.permission_set_groups.selected_ids().clone(),
        }
    }

    /// Whether a run may be started with the current selection
    pub fn can_run(&self) -> bool {
        !self.selection().is_empty()
    }

    /// Watch the latest selection change; `None` until the first one
    pub fn subscribe(&self) -> watch::Receiver<Option<SelectionChanged>> {
        self.changes.subscribe()
    }

    fn replace<I>(&mut self, axis: SelectionAxis, ids: I) -> Result<SelectionChanged, SelectionError>
    where
        I: IntoIterator<Item = PrincipalId>,
    {
        self.listbox_mut(axis).select(ids)?;
        let change = SelectionChanged {
            axis,
            selection: self.selection(),
        };
        tracing::debug!(%axis, principals = change.selection.principal_count(), "selection changed");
        self.changes.send_replace(Some(change.clone()));
        Ok(change)
    }
}

impl Default for PrincipalSelector {
    fn default() -> Self {
        Self::new()
    }
}
