// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed job-type registry.
//!
//! Single source of truth for every job type: its wire value, display
//! metadata, concurrency flag, and mutual-exclusion lock group. Adding a job
//! type means adding exactly one entry here.

use serde::{Deserialize, Serialize};

/// Type of background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Sync,
    SyncScenes,
    SyncPerformers,
    SyncTags,
    SyncStudios,
    Analysis,
    NonAiAnalysis,
    ApplyPlan,
    GenerateDetails,
    StashScan,
    StashGenerate,
    CheckStashGenerate,
    LocalGenerate,
    ProcessDownloads,
    ProcessNewScenes,
    Cleanup,
    RemoveOrphanedEntities,
    Export,
    Import,
    Test,
}

/// Static metadata carried by each job type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTypeMeta {
    /// Wire value, also the `Display` form (e.g. "sync_scenes").
    pub value: &'static str,
    /// Display name (e.g. "Sync Scenes").
    pub label: &'static str,
    /// Category for grouping.
    pub category: &'static str,
    /// Unit for progress display (e.g. "scenes").
    pub unit: Option<&'static str>,
    /// Whether multiple instances may run at once.
    pub allow_concurrent: bool,
    /// Whether this job orchestrates other jobs.
    pub is_workflow: bool,
}

/// Shared lock key for the analysis family.
const ANALYSIS_LOCK: &str = "analysis";
/// Shared lock key for the sync family.
const SYNC_LOCK: &str = "sync";

impl JobType {
    /// Every registered job type, in registry order.
    pub const ALL: [JobType; 20] = [
        JobType::Sync,
        JobType::SyncScenes,
        JobType::SyncPerformers,
        JobType::SyncTags,
        JobType::SyncStudios,
        JobType::Analysis,
        JobType::NonAiAnalysis,
        JobType::ApplyPlan,
        JobType::GenerateDetails,
        JobType::StashScan,
        JobType::StashGenerate,
        JobType::CheckStashGenerate,
        JobType::LocalGenerate,
        JobType::ProcessDownloads,
        JobType::ProcessNewScenes,
        JobType::Cleanup,
        JobType::RemoveOrphanedEntities,
        JobType::Export,
        JobType::Import,
        JobType::Test,
    ];

    pub fn meta(&self) -> JobTypeMeta {
        use JobType::*;
        match self {
            Sync => JobTypeMeta {
                value: "sync",
                label: "Sync",
                category: "Synchronization",
                unit: Some("items"),
                allow_concurrent: false,
                is_workflow: false,
            },
            SyncScenes => JobTypeMeta {
                value: "sync_scenes",
                label: "Sync Scenes",
                category: "Synchronization",
                unit: Some("scenes"),
                allow_concurrent: false,
                is_workflow: false,
            },
            SyncPerformers => JobTypeMeta {
                value: "sync_performers",
                label: "Sync Performers",
                category: "Synchronization",
                unit: Some("performers"),
                allow_concurrent: false,
                is_workflow: false,
            },
            SyncTags => JobTypeMeta {
                value: "sync_tags",
                label: "Sync Tags",
                category: "Synchronization",
                unit: Some("tags"),
                allow_concurrent: false,
                is_workflow: false,
            },
            SyncStudios => JobTypeMeta {
                value: "sync_studios",
                label: "Sync Studios",
                category: "Synchronization",
                unit: Some("studios"),
                allow_concurrent: false,
                is_workflow: false,
            },
            Analysis => JobTypeMeta {
                value: "analysis",
                label: "Scene Analysis",
                category: "AI Analysis",
                unit: Some("scenes"),
                allow_concurrent: false,
                is_workflow: false,
            },
            NonAiAnalysis => JobTypeMeta {
                value: "non_ai_analysis",
                label: "Non-AI Analysis",
                category: "Analysis",
                unit: Some("scenes"),
                allow_concurrent: false,
                is_workflow: false,
            },
            ApplyPlan => JobTypeMeta {
                value: "apply_plan",
                label: "Apply Plan",
                category: "AI Analysis",
                unit: Some("changes"),
                allow_concurrent: false,
                is_workflow: false,
            },
            GenerateDetails => JobTypeMeta {
                value: "generate_details",
                label: "Generate Details",
                category: "AI Analysis",
                unit: Some("scenes"),
                allow_concurrent: false,
                is_workflow: false,
            },
            StashScan => JobTypeMeta {
                value: "stash_scan",
                label: "Stash Metadata Scan",
                category: "Stash Operations",
                unit: Some("files"),
                allow_concurrent: false,
                is_workflow: false,
            },
            StashGenerate => JobTypeMeta {
                value: "stash_generate",
                label: "Stash Generate Metadata",
                category: "Stash Operations",
                unit: Some("items"),
                allow_concurrent: false,
                is_workflow: false,
            },
            CheckStashGenerate => JobTypeMeta {
                value: "check_stash_generate",
                label: "Check Resource Generation",
                category: "Stash Operations",
                unit: Some("resources"),
                allow_concurrent: false,
                is_workflow: false,
            },
            LocalGenerate => JobTypeMeta {
                value: "local_generate",
                label: "Local Generate",
                category: "Stash Operations",
                unit: Some("markers"),
                allow_concurrent: true,
                is_workflow: false,
            },
            ProcessDownloads => JobTypeMeta {
                value: "process_downloads",
                label: "Process Downloads",
                category: "Workflow",
                unit: Some("downloads"),
                allow_concurrent: false,
                is_workflow: false,
            },
            ProcessNewScenes => JobTypeMeta {
                value: "process_new_scenes",
                label: "Process New Scenes",
                category: "Workflow",
                unit: Some("steps"),
                allow_concurrent: false,
                is_workflow: true,
            },
            Cleanup => JobTypeMeta {
                value: "cleanup",
                label: "Cleanup",
                category: "Maintenance",
                unit: None,
                allow_concurrent: false,
                is_workflow: false,
            },
            RemoveOrphanedEntities => JobTypeMeta {
                value: "remove_orphaned_entities",
                label: "Remove Orphaned Entities",
                category: "Maintenance",
                unit: Some("entities"),
                allow_concurrent: false,
                is_workflow: false,
            },
            Export => JobTypeMeta {
                value: "export",
                label: "Export",
                category: "Data Management",
                unit: None,
                allow_concurrent: false,
                is_workflow: false,
            },
            Import => JobTypeMeta {
                value: "import",
                label: "Import",
                category: "Data Management",
                unit: None,
                allow_concurrent: false,
                is_workflow: false,
            },
            Test => JobTypeMeta {
                value: "test",
                label: "Test Job",
                category: "Testing",
                unit: Some("test steps"),
                allow_concurrent: false,
                is_workflow: false,
            },
        }
    }

    /// Wire value ("sync_scenes" style).
    pub fn as_str(&self) -> &'static str {
        self.meta().value
    }

    /// Mutual-exclusion lock key, or `None` for concurrent types.
    ///
    /// The analysis family shares one lock, the sync family another;
    /// every other non-concurrent type serializes on its own name.
    pub fn lock_key(&self) -> Option<&'static str> {
        use JobType::*;
        if self.meta().allow_concurrent {
            return None;
        }
        match self {
            Analysis | NonAiAnalysis | ApplyPlan | GenerateDetails => Some(ANALYSIS_LOCK),
            Sync | SyncScenes | SyncPerformers | SyncTags | SyncStudios => Some(SYNC_LOCK),
            other => Some(other.as_str()),
        }
    }

    /// Parse a wire value back to the enum.
    pub fn from_value(value: &str) -> Option<JobType> {
        JobType::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "job_type_tests.rs"]
mod tests;
