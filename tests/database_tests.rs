use std::sync::Arc;

use futures::FutureExt;
use futures::future::pending;
use sqlx_mysql_toolkit::testing::MockPool;
use tagged_mysql::{Connection, Database, Error, InsertOptions, Value, record, sql};

fn shop() -> (Database<MockPool>, Arc<MockPool>) {
   let pool = Arc::new(MockPool::new());
   pool.describe(
      "users",
      &[("id", "int", "PRI"), ("name", "varchar(255)", "")],
   );
   pool.describe(
      "notes",
      &[("id", "int", "PRI"), ("note", "varchar(255)", "")],
   );

   (Database::new(Arc::clone(&pool)), pool)
}

// ─── Queries ───

#[tokio::test]
async fn test_query_expands_lists_in_place() {
   let (db, pool) = shop();
   let ids = vec![3, 1, 2];

   db.query(sql!(
      "SELECT * FROM users WHERE org = " {7} " AND id IN (" {ids} ") AND name <> " {"x"}
   ))
   .await
   .unwrap();

   let executed = pool.executed().pop().unwrap();
   assert_eq!(
      executed.sql,
      "SELECT * FROM users WHERE org = ? AND id IN (?,?,?) AND name <> ?"
   );
   assert_eq!(
      executed.params,
      vec![
         Value::Int(7),
         Value::Int(3),
         Value::Int(1),
         Value::Int(2),
         Value::Text("x".into())
      ]
   );
}

#[tokio::test]
async fn test_query_rejects_empty_list_before_acquiring() {
   let (db, pool) = shop();

   let err = db
      .query(sql!("SELECT * FROM users WHERE id IN (" {Vec::<i64>::new()} ")"))
      .await
      .unwrap_err();

   assert_eq!(err.error_code(), "USAGE_ERROR");
   assert_eq!(pool.acquired(), 0);
}

#[tokio::test]
async fn test_get_returns_first_row_or_none() {
   let (db, pool) = shop();

   let none = db.get(sql!("SELECT * FROM users WHERE id = " {99})).await.unwrap();
   assert_eq!(none, None);

   pool.respond_rows(
      "FROM users WHERE name",
      vec![
         record! { "id" => 1, "name" => "Ann" },
         record! { "id" => 2, "name" => "Ann" },
      ],
   );
   let row = db
      .get(sql!("SELECT * FROM users WHERE name = " {"Ann"}))
      .await
      .unwrap()
      .unwrap();
   assert_eq!(row["id"], Value::Int(1));
   assert_eq!(pool.leased(), 0);
}

#[tokio::test]
async fn test_run_passes_raw_sql_through() {
   let (db, pool) = shop();

   db.run("SET @n := ?", vec![Value::Int(1)]).await.unwrap();

   let executed = pool.executed().pop().unwrap();
   assert_eq!(executed.sql, "SET @n := ?");
   assert_eq!(executed.params, vec![Value::Int(1)]);
}

#[tokio::test]
async fn test_results_serialize_to_json() {
   let (db, pool) = shop();
   pool.respond_rows(
      "FROM files",
      vec![record! { "name" => "a.txt", "data" => Value::Bytes(b"Hello".to_vec()) }],
   );

   let result = db.query(sql!("SELECT * FROM files")).await.unwrap();
   let json = serde_json::to_value(&result).unwrap();

   assert_eq!(json["rows"][0]["name"], "a.txt");
   assert_eq!(json["rows"][0]["data"], "SGVsbG8=");
   assert_eq!(json["fields"][0]["name"], "name");
   assert_eq!(json["rowsAffected"], 0);
}

// ─── Transactions ───

#[tokio::test]
async fn test_transaction_commits_on_one_connection() {
   let (db, pool) = shop();
   pool.respond(
      "INSERT INTO orders",
      tagged_mysql::QueryResult {
         rows_affected: 1,
         last_insert_id: 17,
         ..Default::default()
      },
   );

   let order_id = db
      .transaction(|conn| {
         Box::pin(async move {
            let order = conn
               .execute("INSERT INTO orders (total) VALUES (?)", vec![Value::Int(10)])
               .await?;
            let q = sql!("UPDATE stock SET n = n - 1 WHERE sku IN (" {["a", "b"]} ")").compile()?;
            conn.execute(&q.sql, q.params).await?;
            Ok(order.last_insert_id)
         })
      })
      .await
      .unwrap();

   assert_eq!(order_id, 17);
   assert_eq!(
      pool.sql_log(),
      vec![
         "START TRANSACTION",
         "INSERT INTO orders (total) VALUES (?)",
         "UPDATE stock SET n = n - 1 WHERE sku IN (?,?)",
         "COMMIT",
      ]
   );
   assert_eq!(pool.acquired(), 1);
   assert_eq!(pool.leased(), 0);
}

#[tokio::test]
async fn test_transaction_rolls_back_and_returns_original_error() {
   let (db, pool) = shop();
   pool.fail_on("UPDATE stock", "Out of range value for column 'n'");

   let err = db
      .transaction(|conn| {
         Box::pin(async move {
            conn.execute("INSERT INTO orders (total) VALUES (?)", vec![Value::Int(10)])
               .await?;
            conn.execute("UPDATE stock SET n = n - 1", vec![]).await?;
            Ok(())
         })
      })
      .await
      .unwrap_err();

   assert_eq!(err.to_string(), "Out of range value for column 'n'");
   let log = pool.sql_log();
   assert_eq!(log.last().unwrap(), "ROLLBACK");
   assert!(!log.iter().any(|s| s == "COMMIT"));
   assert_eq!(pool.leased(), 0);
}

#[tokio::test]
async fn test_concurrent_transactions_use_separate_connections() {
   let (db, pool) = shop();

   let (a, b) = tokio::join!(
      db.transaction(|conn| Box::pin(async move {
         conn.execute("SELECT 1", vec![]).await?;
         Ok(1)
      })),
      db.transaction(|conn| Box::pin(async move {
         conn.execute("SELECT 2", vec![]).await?;
         Ok(2)
      })),
   );

   assert_eq!(a.unwrap() + b.unwrap(), 3);
   assert_eq!(pool.acquired(), 2);
   let log = pool.sql_log();
   assert_eq!(log.iter().filter(|s| *s == "COMMIT").count(), 2);
   assert_eq!(pool.leased(), 0);
}

#[tokio::test]
async fn test_cancelled_transaction_never_returns_to_the_pool() {
   let (db, pool) = shop();

   let cancelled = db
      .transaction(|conn| {
         Box::pin(async move {
            conn.execute("UPDATE stock SET n = n - 1", vec![]).await?;
            pending::<()>().await;
            Ok(())
         })
      })
      .now_or_never();
   assert!(cancelled.is_none());
   assert_eq!(pool.discarded(), 1);
   assert_eq!(pool.leased(), 0);

   // The next transaction starts on a fresh lease
   db.transaction(|conn| {
      Box::pin(async move {
         conn.execute("SELECT 1", vec![]).await?;
         Ok(())
      })
   })
   .await
   .unwrap();
   assert_eq!(pool.acquired(), 2);
   assert_eq!(pool.discarded(), 1);
}

// ─── Tables ───

#[tokio::test]
async fn test_table_schema_is_cached_per_database() {
   let (db, pool) = shop();

   db.table("users").await.unwrap();
   db.clone().table("users").await.unwrap();
   db.table("notes").await.unwrap();

   let describes: Vec<String> = pool
      .sql_log()
      .into_iter()
      .filter(|s| s.starts_with("DESCRIBE"))
      .collect();
   assert_eq!(describes, vec!["DESCRIBE `users`", "DESCRIBE `notes`"]);

   // A separate database handle over the same pool has its own cache
   Database::new(Arc::clone(&pool)).table("users").await.unwrap();
   assert_eq!(
      pool.sql_log().iter().filter(|s| s.starts_with("DESCRIBE")).count(),
      3
   );
}

#[tokio::test]
async fn test_table_insert_update_sanitize() {
   let (db, pool) = shop();
   let users = db.table("users").await.unwrap();

   users
      .insert(
         [
            record! { "id" => 1, "name" => "a" },
            record! { "id" => 2, "name" => "b" },
         ],
         InsertOptions::default(),
      )
      .await
      .unwrap();
   let insert = pool.executed().pop().unwrap();
   assert_eq!(insert.sql, "INSERT INTO `users` (`id`,`name`) VALUES (?,?),(?,?)");
   assert_eq!(
      insert.params,
      vec![
         Value::Int(1),
         Value::Text("a".into()),
         Value::Int(2),
         Value::Text("b".into())
      ]
   );

   users.update(&record! { "id" => 1, "name" => "x" }, None).await.unwrap();
   let update = pool.executed().pop().unwrap();
   assert_eq!(update.sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
   assert_eq!(update.params, vec![Value::Text("x".into()), Value::Int(1)]);

   let notes = db.table("notes").await.unwrap();
   let mut rows = vec![record! { "id" => 1, "note" => "x".repeat(300) }];
   let warnings = notes.sanitize(&mut rows);
   assert_eq!(warnings.len(), 1);
   assert_eq!(warnings[0].message, "exceeded length (300 > 255)");
   assert_eq!(rows[0]["note"].as_str().unwrap().len(), 255);
   assert_eq!(pool.leased(), 0);
}

#[tokio::test]
async fn test_table_errors() {
   let (db, pool) = shop();
   pool.fail_on("DESCRIBE `missing`", "Table 'shop.missing' doesn't exist");

   let err = db.table("missing").await.err().unwrap();
   assert!(err.to_string().contains("doesn't exist"));

   let err = db.table("").await.err().unwrap();
   assert!(matches!(err, Error::Usage(_)));

   pool.describe("audit", &[("at", "datetime", ""), ("what", "text", "")]);
   let audit = db.table("audit").await.unwrap();
   let err = audit.update(&record! { "what" => "x" }, None).await.unwrap_err();
   assert!(matches!(err, Error::Configuration(_)));
}

// ─── Lifecycle ───

#[tokio::test]
async fn test_close_fails_later_operations() {
   let (db, pool) = shop();

   db.close().await;
   assert!(pool.is_closed());

   let err = db.run("SELECT 1", vec![]).await.unwrap_err();
   assert_eq!(err.error_code(), "DATABASE_CLOSED");
}

#[tokio::test]
async fn test_acquire_failure_propagates() {
   let (db, pool) = shop();
   pool.fail_acquire("Too many connections");

   let err = db.get(sql!("SELECT 1")).await.unwrap_err();
   assert_eq!(err.to_string(), "Too many connections");

   let err = db
      .transaction(|_conn| Box::pin(async { Ok(()) }))
      .await
      .unwrap_err();
   assert_eq!(err.to_string(), "Too many connections");
   assert!(pool.sql_log().is_empty());
}
