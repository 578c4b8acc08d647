pub mod ids;
pub mod model;
pub mod report;
pub mod row;
pub mod upos;

// Re-export core types for convenience
pub use ids::{HeadRef, IdError, NodeId};
pub use model::*;
pub use report::*;
pub use row::{universal_part, Column, Dep, DepsError, Misc, Row, RowError, COLUMN_COUNT};
pub use upos::{Upos, UposSet};

#[cfg(test)]
mod tests {
    use super::*;
    use rkyv::{from_bytes, to_bytes};

    fn sample_database() -> RuleDatabase {
        RuleDatabase {
            version: 1,
            languages: vec![LanguageData {
                code: "la".to_string(),
                features: vec![FeatureRecord {
                    name: "Case".to_string(),
                    permitted: true,
                    uvalues: vec!["Nom".to_string(), "Acc".to_string()],
                    lvalues: vec![],
                    unused_uvalues: vec![],
                    unused_lvalues: vec![],
                    by_upos: vec![("NOUN".to_string(), vec![("Nom".to_string(), true)])],
                    errors: vec![],
                }],
                deprels: vec![DeprelRecord {
                    name: "obl:arg".to_string(),
                    kind: DeprelKind::Global,
                    permitted: true,
                    errors: vec![],
                }],
                edeprels: vec![],
                tokens_with_space: vec![],
                auxiliaries: vec![AuxiliaryRecord {
                    lemma: "sum".to_string(),
                    functions: vec!["cop.AUX".to_string(), "aux.pass".to_string()],
                }],
            }],
        }
    }

    #[test]
    fn test_enum_serialization() {
        let original = DeprelKind::Local;

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize DeprelKind");
        let deserialized: DeprelKind = from_bytes(&bytes).expect("Failed to deserialize DeprelKind");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_database_archive_round_trip() {
        let db = sample_database();
        let bytes = to_bytes::<_, 1024>(&db).expect("Failed to serialize RuleDatabase");

        let restored = RuleDatabase::from_archive(&bytes).expect("archive should validate");
        assert_eq!(restored, db);
    }

    #[test]
    fn test_archived_provider_matches_owned() {
        let db = sample_database();
        let bytes = to_bytes::<_, 1024>(&db).expect("Failed to serialize RuleDatabase");
        let archived = check_archive(&bytes).expect("archive should validate");

        assert_eq!(archived.language("la"), db.language("la"));
        assert!(archived.language("grc").is_none());
        assert!(NoLanguageData.language("la").is_none());
    }

    #[test]
    fn test_garbage_archive_is_rejected() {
        let garbage = rkyv::AlignedVec::new();
        assert!(RuleDatabase::from_archive(&garbage).is_err());
    }

    #[test]
    fn test_auxiliary_classification() {
        let sum = &sample_database().languages[0].auxiliaries[0];
        assert!(sum.is_auxiliary());
        assert!(sum.is_copula());

        let pronoun = AuxiliaryRecord {
            lemma: "to".to_string(),
            functions: vec!["cop.PRON".to_string()],
        };
        assert!(!pronoun.is_auxiliary());
        assert!(pronoun.is_copula());
    }
}
