//! Anchors extracted entities and relationships, positioned in whole-document
//! character coordinates, to the upstream chunk identifiers they fall
//! within. Pure, allocation-light logic over plain structs; no I/O.

const OVERLAP_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBoundary {
    pub vector_rowid: i64,
    pub chunk_index: u32,
    pub char_start: usize,
    pub char_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAppearance {
    pub vector_rowid: i64,
    pub chunk_index: u32,
    pub offset_start: usize,
    pub offset_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityChunkMapping {
    pub chunk_appearances: Vec<ChunkAppearance>,
    pub spans_multiple_chunks: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipChunkMapping {
    pub spans_chunks: bool,
    pub chunk_rowids: Vec<i64>,
    pub primary_chunk_rowid: Option<i64>,
}

fn overlap(occ_start: usize, occ_end: usize, chunk_start: usize, chunk_end: usize) -> usize {
    let overlap_start = occ_start.max(chunk_start);
    let overlap_end = occ_end.min(chunk_end);
    overlap_end.saturating_sub(overlap_start)
}

/// Maps one entity's occurrences (character ranges in document coordinates)
/// onto the chunks whose range overlaps each occurrence by at least
/// [`OVERLAP_THRESHOLD`] characters, deduping by `(vector_rowid,
/// chunk_index)` so a single occurrence spanning two adjacent chunks does
/// not produce duplicate appearances.
pub fn map_entity_to_chunks(
    occurrences: &[(usize, usize)],
    chunks: &[ChunkBoundary],
) -> EntityChunkMapping {
    let mut chunk_appearances = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for &(occ_start, occ_end) in occurrences {
        for chunk in chunks {
            if overlap(occ_start, occ_end, chunk.char_start, chunk.char_end) < OVERLAP_THRESHOLD {
                continue;
            }

            let key = (chunk.vector_rowid, chunk.chunk_index);
            if !seen.insert(key) {
                continue;
            }

            let chunk_len = chunk.char_end.saturating_sub(chunk.char_start);
            let offset_start = occ_start.saturating_sub(chunk.char_start);
            let offset_end = occ_end.saturating_sub(chunk.char_start).min(chunk_len);

            chunk_appearances.push(ChunkAppearance {
                vector_rowid: chunk.vector_rowid,
                chunk_index: chunk.chunk_index,
                offset_start,
                offset_end,
            });
        }
    }

    let spans_multiple_chunks = chunk_appearances.len() > 1;

    EntityChunkMapping {
        chunk_appearances,
        spans_multiple_chunks,
    }
}

/// Determines the primary chunk for a relationship by the priority order:
/// a shared chunk (lowest `vector_rowid`); otherwise the subject/object
/// chunk pair with the smallest `chunk_index` distance (returning the
/// lower `vector_rowid` of that pair); otherwise the lowest subject chunk;
/// otherwise the lowest object chunk; otherwise `None`.
fn find_primary_chunk(
    subject_appearances: &[ChunkAppearance],
    object_appearances: &[ChunkAppearance],
    chunks: &[ChunkBoundary],
) -> Option<i64> {
    let chunk_index_of = |rowid: i64| -> u32 {
        chunks
            .iter()
            .find(|c| c.vector_rowid == rowid)
            .map_or(0, |c| c.chunk_index)
    };

    let subject_rowids: Vec<i64> = subject_appearances.iter().map(|a| a.vector_rowid).collect();
    let object_rowids: Vec<i64> = object_appearances.iter().map(|a| a.vector_rowid).collect();

    let shared: Vec<i64> = subject_rowids
        .iter()
        .copied()
        .filter(|r| object_rowids.contains(r))
        .collect();
    if let Some(&min_shared) = shared.iter().min() {
        return Some(min_shared);
    }

    if !subject_rowids.is_empty() && !object_rowids.is_empty() {
        let mut min_distance = u32::MAX;
        let mut primary = None;
        for &subj in &subject_rowids {
            for &obj in &object_rowids {
                let distance = chunk_index_of(subj).abs_diff(chunk_index_of(obj));
                if distance < min_distance {
                    min_distance = distance;
                    primary = Some(subj.min(obj));
                }
            }
        }
        return primary;
    }

    if let Some(min_subject) = subject_rowids.iter().min() {
        return Some(*min_subject);
    }

    object_rowids.iter().min().copied()
}

/// Maps a relationship onto the chunks its subject and object entities
/// appear in. `spans_chunks` is true when the subject and object share no
/// common chunk.
pub fn map_relationship_to_chunks(
    subject_mapping: &EntityChunkMapping,
    object_mapping: &EntityChunkMapping,
    chunks: &[ChunkBoundary],
) -> RelationshipChunkMapping {
    let subject_rowids: std::collections::HashSet<i64> = subject_mapping
        .chunk_appearances
        .iter()
        .map(|a| a.vector_rowid)
        .collect();
    let object_rowids: std::collections::HashSet<i64> = object_mapping
        .chunk_appearances
        .iter()
        .map(|a| a.vector_rowid)
        .collect();

    let shared_count = subject_rowids.intersection(&object_rowids).count();
    let spans_chunks = shared_count == 0;

    let mut chunk_rowids: Vec<i64> = subject_rowids.union(&object_rowids).copied().collect();
    chunk_rowids.sort_unstable();

    let primary_chunk_rowid = find_primary_chunk(
        &subject_mapping.chunk_appearances,
        &object_mapping.chunk_appearances,
        chunks,
    );

    RelationshipChunkMapping {
        spans_chunks,
        chunk_rowids,
        primary_chunk_rowid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<ChunkBoundary> {
        vec![
            ChunkBoundary { vector_rowid: 1, chunk_index: 0, char_start: 0, char_end: 100 },
            ChunkBoundary { vector_rowid: 2, chunk_index: 1, char_start: 90, char_end: 200 },
            ChunkBoundary { vector_rowid: 3, chunk_index: 2, char_start: 200, char_end: 300 },
        ]
    }

    #[test]
    fn overlap_of_nine_does_not_map_but_ten_does() {
        let chunks = chunks();
        let occurrences_nine = [(81usize, 91usize)];
        let mapping = map_entity_to_chunks(&occurrences_nine, &chunks);
        assert!(mapping.chunk_appearances.is_empty());

        let occurrences_ten = [(80usize, 91usize)];
        let mapping = map_entity_to_chunks(&occurrences_ten, &chunks);
        assert_eq!(mapping.chunk_appearances.len(), 1);
        assert_eq!(mapping.chunk_appearances[0].vector_rowid, 1);
    }

    #[test]
    fn occurrence_spanning_boundary_maps_to_both_chunks_and_flags_span() {
        let chunks = chunks();
        let occurrences = [(85usize, 110usize)];
        let mapping = map_entity_to_chunks(&occurrences, &chunks);
        assert_eq!(mapping.chunk_appearances.len(), 2);
        assert!(mapping.spans_multiple_chunks);
    }

    #[test]
    fn chunk_local_offsets_are_relative_to_chunk_start() {
        let chunks = chunks();
        let occurrences = [(95usize, 120usize)];
        let mapping = map_entity_to_chunks(&occurrences, &chunks);
        let second = mapping
            .chunk_appearances
            .iter()
            .find(|a| a.vector_rowid == 2)
            .unwrap();
        assert_eq!(second.offset_start, 5);
        assert_eq!(second.offset_end, 30);
    }

    #[test]
    fn duplicate_appearances_in_same_chunk_are_deduped() {
        let chunks = chunks();
        let occurrences = [(10usize, 20usize), (30usize, 40usize)];
        let mapping = map_entity_to_chunks(&occurrences, &chunks);
        assert_eq!(mapping.chunk_appearances.len(), 1);
        assert!(!mapping.spans_multiple_chunks);
    }

    #[test]
    fn relationship_prefers_shared_chunk() {
        let chunks = chunks();
        let subject = map_entity_to_chunks(&[(10, 20)], &chunks);
        let object = map_entity_to_chunks(&[(15, 25)], &chunks);
        let mapping = map_relationship_to_chunks(&subject, &object, &chunks);
        assert!(!mapping.spans_chunks);
        assert_eq!(mapping.primary_chunk_rowid, Some(1));
    }

    #[test]
    fn relationship_falls_back_to_nearest_pair_when_no_shared_chunk() {
        let chunks = chunks();
        let subject = map_entity_to_chunks(&[(10, 20)], &chunks);
        let object = map_entity_to_chunks(&[(250, 260)], &chunks);
        let mapping = map_relationship_to_chunks(&subject, &object, &chunks);
        assert!(mapping.spans_chunks);
        assert_eq!(mapping.chunk_rowids, vec![1, 3]);
        assert_eq!(mapping.primary_chunk_rowid, Some(1));
    }

    #[test]
    fn relationship_with_no_mapped_object_falls_back_to_subject_only() {
        let chunks = chunks();
        let subject = map_entity_to_chunks(&[(10, 20)], &chunks);
        let object = EntityChunkMapping { chunk_appearances: vec![], spans_multiple_chunks: false };
        let mapping = map_relationship_to_chunks(&subject, &object, &chunks);
        assert_eq!(mapping.primary_chunk_rowid, Some(1));
        assert!(mapping.spans_chunks);
    }
}
