use std::path::PathBuf;

use serde::Serialize;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::Embedding;

/// One ranked candidate for a query face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub name: String,
    pub distance: f32,
    pub similarity_score: f32,
    pub image_path: PathBuf,
}

/// Euclidean distance. Embeddings of different dimension are not
/// comparable.
pub fn distance(a: &Embedding, b: &Embedding) -> Result<f32> {
    if a.dim() != b.dim() {
        return Err(Error::DimensionMismatch {
            expected: a.dim(),
            found: b.dim(),
        });
    }
    let diff = &a.view() - &b.view();
    Ok(diff.dot(&diff).sqrt())
}

/// Map a distance to a 0..=100 score, `max(0, 100 - 100 * d)`. Linear and
/// uncalibrated.
pub fn similarity_score(distance: f32) -> f32 {
    (100.0 - 100.0 * distance).max(0.0)
}

/// Exact nearest-neighbour scan: every record ordered by distance to
/// `query`, nearest first, ties by identity name, cut to `top_k`.
pub fn rank(query: &Embedding, database: &Database, top_k: usize) -> Result<Vec<MatchResult>> {
    if database.is_empty() {
        return Err(Error::EmptyDatabase);
    }

    let mut matches = database
        .records()
        .map(|record| {
            let d = distance(query, &record.embedding)?;
            Ok(MatchResult {
                name: record.name.clone(),
                distance: d,
                similarity_score: similarity_score(d),
                image_path: record.image_path.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    matches.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.name.cmp(&b.name))
    });
    matches.truncate(top_k);
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CelebrityRecord;

    fn db(entries: &[(&str, Vec<f32>)]) -> Database {
        let mut db = Database::new();
        for (name, values) in entries {
            db.insert(CelebrityRecord {
                name: name.to_string(),
                embedding: Embedding::from(values.clone()),
                image_path: PathBuf::from(format!("/lib/{name}/folder.jpg")),
            })
            .unwrap();
        }
        db
    }

    #[test]
    fn test_score_anchors() {
        assert_eq!(similarity_score(0.0), 100.0);
        assert_eq!(similarity_score(1.2), 0.0);
        assert_eq!(similarity_score(0.35), 65.0);
        assert_eq!(similarity_score(1.0), 0.0);
    }

    #[test]
    fn test_distance() {
        let a = Embedding::from(vec![0.0, 0.0]);
        let b = Embedding::from(vec![3.0, 4.0]);
        assert_eq!(distance(&a, &b).unwrap(), 5.0);
        assert_eq!(distance(&b, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let a = Embedding::from(vec![0.0, 0.0]);
        let b = Embedding::from(vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            distance(&a, &b),
            Err(Error::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn test_rank_empty_database() {
        let q = Embedding::from(vec![0.0]);
        assert!(matches!(rank(&q, &Database::new(), 10), Err(Error::EmptyDatabase)));
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let db = db(&[
            ("Far", vec![3.0, 4.0]),
            ("Near", vec![0.0, 0.35]),
            ("Exact", vec![0.0, 0.0]),
            ("Mid", vec![0.0, 1.2]),
        ]);
        let q = Embedding::from(vec![0.0, 0.0]);

        let all = rank(&q, &db, 10).unwrap();
        let names: Vec<_> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Exact", "Near", "Mid", "Far"]);
        assert_eq!(all[0].similarity_score, 100.0);
        assert_eq!(all[1].similarity_score, 65.0);
        assert_eq!(all[2].similarity_score, 0.0);
        assert_eq!(all[3].distance, 5.0);
        assert_eq!(all[3].image_path, PathBuf::from("/lib/Far/folder.jpg"));

        let top = rank(&q, &db, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top, all[..2].to_vec());
    }

    #[test]
    fn test_rank_ties_by_name() {
        let db = db(&[("Cy", vec![1.0]), ("Al", vec![-1.0]), ("Bo", vec![1.0])]);
        let names: Vec<_> = rank(&Embedding::from(vec![0.0]), &db, 3)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Al", "Bo", "Cy"]);
    }

    #[test]
    fn test_rank_length_and_order_property() {
        let entries: Vec<(String, Vec<f32>)> = (0..25)
            .map(|i| (format!("id{i:02}"), vec![(i * 7 % 11) as f32, (i % 5) as f32]))
            .collect();
        let refs: Vec<(&str, Vec<f32>)> =
            entries.iter().map(|(n, v)| (n.as_str(), v.clone())).collect();
        let db = db(&refs);
        let q = Embedding::from(vec![2.5, 1.5]);

        for top_k in [0, 1, 10, 25, 40] {
            let ranked = rank(&q, &db, top_k).unwrap();
            assert_eq!(ranked.len(), top_k.min(db.len()));
            assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_rank_query_dimension_mismatch() {
        let db = db(&[("Ada", vec![0.0, 1.0])]);
        assert!(matches!(
            rank(&Embedding::from(vec![0.0]), &db, 10),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
