// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GraphQL operation documents for the upstream contract.

pub const FIND_SCENES: &str = r#"
query FindScenes($filter: FindFilterType, $scene_filter: SceneFilterType, $scene_ids: [Int!]) {
    findScenes(filter: $filter, scene_filter: $scene_filter, scene_ids: $scene_ids) {
        count
        scenes {
            id
            title
            organized
            details
            date
            rating100
            files {
                path
                size
                duration
                width
                height
                frame_rate
                bit_rate
                video_codec
                audio_codec
            }
            performers { id name }
            tags { id name }
            studio { id name }
            created_at
            updated_at
        }
    }
}
"#;

pub const SCENE_UPDATE: &str = r#"
mutation SceneUpdate($input: SceneUpdateInput!) {
    sceneUpdate(input: $input) {
        id
    }
}
"#;

pub const FIND_PERFORMERS: &str = r#"
query FindPerformers($filter: FindFilterType, $performer_filter: PerformerFilterType) {
    findPerformers(filter: $filter, performer_filter: $performer_filter) {
        count
        performers { id name }
    }
}
"#;

pub const FIND_TAGS: &str = r#"
query FindTags($filter: FindFilterType, $tag_filter: TagFilterType) {
    findTags(filter: $filter, tag_filter: $tag_filter) {
        count
        tags { id name }
    }
}
"#;

pub const FIND_STUDIOS: &str = r#"
query FindStudios($filter: FindFilterType, $studio_filter: StudioFilterType) {
    findStudios(filter: $filter, studio_filter: $studio_filter) {
        count
        studios { id name }
    }
}
"#;

pub const TAG_CREATE: &str = r#"
mutation TagCreate($input: TagCreateInput!) {
    tagCreate(input: $input) {
        id
        name
    }
}
"#;

pub const METADATA_SCAN: &str = r#"
mutation MetadataScan($input: ScanMetadataInput!) {
    metadataScan(input: $input)
}
"#;

pub const METADATA_GENERATE: &str = r#"
mutation MetadataGenerate($input: GenerateMetadataInput!) {
    metadataGenerate(input: $input)
}
"#;

pub const STOP_JOB: &str = r#"
mutation StopJob($job_id: ID!) {
    stopJob(job_id: $job_id)
}
"#;

pub const FIND_JOB: &str = r#"
query FindJob($input: FindJobInput!) {
    findJob(input: $input) {
        id
        status
        progress
        description
        startTime
        endTime
        error
    }
}
"#;

pub const VERSION: &str = r#"
query Version {
    version {
        version
        hash
        build_time
    }
}
"#;
