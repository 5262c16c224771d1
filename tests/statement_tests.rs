#[cfg(test)]
mod statement_tests {
    use asqlite::{consts, Connection, Value};
    use std::f64::consts::PI;

    const ROW_COUNT: usize = 10;

    async fn seeded_db() -> Connection {
        let db = Connection::open_in_memory().await.unwrap();
        let create = db
            .prepare("CREATE TABLE foo (txt TEXT, num INTEGER, flt FLOAT, blb BLOB)")
            .await
            .unwrap();
        create.run().await.unwrap();
        create.finalize().await.unwrap();

        let insert = db.prepare("INSERT INTO foo VALUES(?, ?, ?, ?)").await.unwrap();
        for i in 0..ROW_COUNT {
            // The blob column stays unbound and lands as NULL.
            insert
                .run_with((format!("String {i}"), i as i64, i as f64 * PI))
                .await
                .unwrap();
        }
        insert.finalize().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_prepare_invalid_sql_rejects() {
        let db = Connection::open_in_memory().await.unwrap();

        let err = db.prepare("CRATE TALE foo text bar)").await.unwrap_err();
        assert_eq!(err.code(), consts::ERROR);
        assert!(
            err.to_string().contains("syntax error"),
            "message must report the syntax failure: {err}"
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_busy_until_finalized() {
        let db = Connection::open_in_memory().await.unwrap();
        let stmt = db.prepare("CREATE TABLE foo (text bar)").await.unwrap();
        stmt.run().await.unwrap();

        let err = db.close().await.unwrap_err();
        assert_eq!(err.code(), consts::BUSY);

        stmt.finalize().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_statement_reports_sql_text() {
        let db = seeded_db().await;
        let stmt = db
            .prepare("SELECT txt, num, flt, blb FROM foo ORDER BY num")
            .await
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT txt, num, flt, blb FROM foo ORDER BY num");
        stmt.finalize().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_get_steps_rows_then_exhausts() {
        let db = seeded_db().await;
        let stmt = db
            .prepare("SELECT txt, num, flt, blb FROM foo ORDER BY num")
            .await
            .unwrap();

        // Step past the end on purpose; the cursor keeps resolving None.
        for i in 0..ROW_COUNT + 5 {
            let row = stmt.get().await.unwrap();
            if i >= ROW_COUNT {
                assert!(row.is_none());
                continue;
            }
            let row = row.unwrap();
            assert_eq!(
                row.column("txt"),
                Some(&Value::Text(format!("String {i}")))
            );
            assert_eq!(row.column("num"), Some(&Value::Integer(i as i64)));
            assert_eq!(row.column("flt"), Some(&Value::Real(i as f64 * PI)));
            assert!(row.column("blb").unwrap().is_null());
        }

        stmt.finalize().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_replays_first_row() {
        let db = seeded_db().await;
        let stmt = db
            .prepare("SELECT txt, num, flt, blb FROM foo ORDER BY num")
            .await
            .unwrap();

        for _ in 0..ROW_COUNT {
            stmt.reset().await.unwrap();
            let row = stmt.get().await.unwrap().unwrap();
            assert_eq!(
                row.column("txt"),
                Some(&Value::Text("String 0".to_string()))
            );
            assert_eq!(row.column("num"), Some(&Value::Integer(0)));
            assert_eq!(row.column("flt"), Some(&Value::Real(0.0)));
            assert!(row.column("blb").unwrap().is_null());
        }

        stmt.finalize().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_changes_the_replayed_result() {
        let db = seeded_db().await;
        let stmt = db
            .prepare("SELECT num FROM foo WHERE num > ? ORDER BY num")
            .await
            .unwrap();

        stmt.bind((5,)).await.unwrap();
        let row = stmt.get().await.unwrap().unwrap();
        assert_eq!(row.column("num"), Some(&Value::Integer(6)));

        // Reset replays the same first row while the binding is unchanged.
        stmt.reset().await.unwrap();
        let row = stmt.get().await.unwrap().unwrap();
        assert_eq!(row.column("num"), Some(&Value::Integer(6)));

        // A fresh bind starts a fresh result.
        stmt.bind((7,)).await.unwrap();
        let row = stmt.get().await.unwrap().unwrap();
        assert_eq!(row.column("num"), Some(&Value::Integer(8)));

        stmt.finalize().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_repeats_and_chains() {
        let db = Connection::open_in_memory().await.unwrap();
        db.run("CREATE TABLE foo (num INTEGER)").await.unwrap();

        let stmt = db.prepare("INSERT INTO foo VALUES (?)").await.unwrap();
        stmt.run_with((1,)).await.unwrap().run_with((2,)).await.unwrap();
        stmt.finalize().await.unwrap();

        let rows = db.all("SELECT num FROM foo ORDER BY num").await.unwrap();
        assert_eq!(rows.len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_with_initial_parameters() {
        let db = seeded_db().await;
        let stmt = db
            .prepare_with("SELECT txt FROM foo WHERE num = ?", (3,))
            .await
            .unwrap();
        let row = stmt.get().await.unwrap().unwrap();
        assert_eq!(
            row.column("txt"),
            Some(&Value::Text("String 3".to_string()))
        );
        stmt.finalize().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_after_finalize_reject_misuse() {
        let db = Connection::open_in_memory().await.unwrap();
        let stmt = db.prepare("SELECT 1").await.unwrap();
        stmt.finalize().await.unwrap();

        let err = stmt.run().await.unwrap_err();
        assert_eq!(err.code(), consts::MISUSE);
        let err = stmt.get().await.unwrap_err();
        assert_eq!(err.code(), consts::MISUSE);
        let err = stmt.finalize().await.unwrap_err();
        assert_eq!(err.code(), consts::MISUSE);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_statement_releases_its_slot() {
        let db = Connection::open_in_memory().await.unwrap();
        let stmt = db.prepare("SELECT 1").await.unwrap();
        drop(stmt);

        // The drop-time finalize is ordered before the close command on
        // the same worker queue.
        db.close().await.unwrap();
    }
}
