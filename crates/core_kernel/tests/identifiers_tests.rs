//! Comprehensive unit tests for the Identifiers module
//!
//! Tests cover all identifier types, their creation, parsing,
//! conversion, and display formatting.

use core_kernel::{ChecklistId, CustomerId, InvoiceId, OrderId, PartyId};
use uuid::Uuid;

mod order_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = OrderId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(OrderId::prefix(), "ORD");
    }

    #[test]
    fn test_display_format() {
        let id = OrderId::new();
        let display = id.to_string();
        assert!(display.starts_with("ORD-"));
    }

    #[test]
    fn test_from_str_with_prefix() {
        let original = OrderId::new();
        let string = original.to_string();
        let parsed: OrderId = string.parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_str_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: OrderId = uuid.to_string().parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        let result: Result<OrderId, _> = "not-a-uuid".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let id: OrderId = uuid.into();
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_json_serialization() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}

mod party_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = PartyId::new();
        let id2 = PartyId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(PartyId::prefix(), "PTY");
    }

    #[test]
    fn test_display_format() {
        let id = PartyId::new();
        let display = id.to_string();
        assert!(display.starts_with("PTY-"));
    }

    #[test]
    fn test_roundtrip() {
        let original = PartyId::new();
        let string = original.to_string();
        let parsed: PartyId = string.parse().unwrap();
        assert_eq!(original, parsed);
    }
}

mod customer_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = CustomerId::new();
        let id2 = CustomerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(CustomerId::prefix(), "CUS");
    }

    #[test]
    fn test_display_format() {
        let id = CustomerId::new();
        let display = id.to_string();
        assert!(display.starts_with("CUS-"));
    }
}

mod invoice_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = InvoiceId::new();
        let id2 = InvoiceId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(InvoiceId::prefix(), "INV");
    }

    #[test]
    fn test_display_format() {
        let id = InvoiceId::new();
        let display = id.to_string();
        assert!(display.starts_with("INV-"));
    }
}

mod cross_type_tests {
    use super::*;

    #[test]
    fn test_different_id_types_are_distinct() {
        // Same UUID should create different identifier instances
        // that are type-safe (can't mix OrderId with PartyId)
        let uuid = Uuid::new_v4();
        let order_id = OrderId::from_uuid(uuid);
        let party_id = PartyId::from_uuid(uuid);

        // They contain the same UUID but are different types
        assert_eq!(*order_id.as_uuid(), *party_id.as_uuid());
    }

    #[test]
    fn test_id_prefixes_are_unique() {
        let prefixes = vec![
            OrderId::prefix(),
            PartyId::prefix(),
            ChecklistId::prefix(),
            CustomerId::prefix(),
            InvoiceId::prefix(),
        ];

        // Check all prefixes are unique
        let mut unique_prefixes: Vec<&str> = prefixes.clone();
        unique_prefixes.sort();
        unique_prefixes.dedup();

        assert_eq!(
            prefixes.len(),
            unique_prefixes.len(),
            "All identifier prefixes should be unique"
        );
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn test_nil_uuid() {
        let nil_uuid = Uuid::nil();
        let id = OrderId::from_uuid(nil_uuid);
        assert!(id.as_uuid().is_nil());
    }

    #[test]
    fn test_max_uuid() {
        let max_uuid = Uuid::max();
        let id = OrderId::from_uuid(max_uuid);
        assert_eq!(*id.as_uuid(), max_uuid);
    }
}
