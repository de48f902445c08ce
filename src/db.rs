//! SQLite catalog store: schema and operations

use rusqlite::{Connection, Transaction};

use crate::error::ChainResult;
use crate::models::{Catalog, Process, ProcessEntry, Product, UnitsPerRun};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> ChainResult<()> {
    conn.execute_batch(
        r#"
        -- position preserves catalog order; the first producer is the default choice
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS processes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            building_id TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        -- units_per_run is catalog text; '' means not applicable
        CREATE TABLE IF NOT EXISTS process_inputs (
            process_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            units_per_run TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS process_outputs (
            process_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            units_per_run TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_process_inputs_process ON process_inputs(process_id);
        CREATE INDEX IF NOT EXISTS idx_process_outputs_process ON process_outputs(process_id);
        CREATE INDEX IF NOT EXISTS idx_process_outputs_product ON process_outputs(product_id);
        "#,
    )?;
    Ok(())
}

/// Clear the whole catalog (for re-import)
pub fn clear_catalog(conn: &Connection) -> ChainResult<()> {
    conn.execute_batch(
        r#"
        DELETE FROM process_outputs;
        DELETE FROM process_inputs;
        DELETE FROM processes;
        DELETE FROM products;
        "#,
    )?;
    Ok(())
}

/// Append a catalog fragment after whatever is already stored.
///
/// Re-inserting an existing id replaces it in place, keeping its position.
pub fn append_catalog(conn: &mut Connection, catalog: &Catalog) -> ChainResult<()> {
    let tx = conn.transaction()?;
    let mut next_product = next_position(&tx, "products")?;
    for product in &catalog.products {
        upsert_product(&tx, product, next_product)?;
        next_product += 1;
    }
    let mut next_process = next_position(&tx, "processes")?;
    for process in &catalog.processes {
        upsert_process(&tx, process, next_process)?;
        next_process += 1;
    }
    tx.commit()?;
    Ok(())
}

fn next_position(tx: &Transaction<'_>, table: &str) -> ChainResult<i64> {
    let sql = format!("SELECT COALESCE(MAX(position) + 1, 0) FROM {table}");
    Ok(tx.query_row(&sql, [], |row| row.get(0))?)
}

fn upsert_product(tx: &Transaction<'_>, product: &Product, position: i64) -> ChainResult<()> {
    tx.execute(
        "INSERT INTO products (id, name, position) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        (&product.id, &product.name, position),
    )?;
    Ok(())
}

fn upsert_process(tx: &Transaction<'_>, process: &Process, position: i64) -> ChainResult<()> {
    tx.execute(
        "INSERT INTO processes (id, name, building_id, position) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, building_id = excluded.building_id",
        (&process.id, &process.name, &process.building_id, position),
    )?;
    tx.execute("DELETE FROM process_inputs WHERE process_id = ?1", [&process.id])?;
    tx.execute("DELETE FROM process_outputs WHERE process_id = ?1", [&process.id])?;

    for (pos, input) in process.inputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO process_inputs (process_id, product_id, units_per_run, position)
             VALUES (?1, ?2, ?3, ?4)",
            (&process.id, &input.product_id, input.units_per_run.to_string(), pos as i64),
        )?;
    }
    for (pos, output) in process.outputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO process_outputs (process_id, product_id, units_per_run, position)
             VALUES (?1, ?2, ?3, ?4)",
            (&process.id, &output.product_id, output.units_per_run.to_string(), pos as i64),
        )?;
    }
    Ok(())
}

/// Load the full catalog in stored order
pub fn load_catalog(conn: &Connection) -> ChainResult<Catalog> {
    let products = list_products(conn)?;

    let mut stmt = conn.prepare("SELECT id, name, building_id FROM processes ORDER BY position")?;
    let rows = stmt.query_map([], |row| {
        Ok(Process {
            id: row.get(0)?,
            name: row.get(1)?,
            building_id: row.get(2)?,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    })?;

    let mut processes = Vec::new();
    for row in rows {
        let mut process = row?;
        process.inputs = get_entries(conn, "process_inputs", &process.id)?;
        process.outputs = get_entries(conn, "process_outputs", &process.id)?;
        processes.push(process);
    }

    Ok(Catalog {
        products,
        processes,
    })
}

fn get_entries(conn: &Connection, table: &str, process_id: &str) -> ChainResult<Vec<ProcessEntry>> {
    let sql = format!(
        "SELECT product_id, units_per_run FROM {table} WHERE process_id = ?1 ORDER BY position"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([process_id], |row| {
        let units: String = row.get(1)?;
        Ok(ProcessEntry {
            product_id: row.get(0)?,
            units_per_run: UnitsPerRun::parse(&units),
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all products in catalog order
pub fn list_products(conn: &Connection) -> ChainResult<Vec<Product>> {
    let mut stmt = conn.prepare("SELECT id, name FROM products ORDER BY position")?;
    let rows = stmt.query_map([], |row| {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Number of stored (products, processes)
pub fn counts(conn: &Connection) -> ChainResult<(usize, usize)> {
    let products: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
    let processes: i64 = conn.query_row("SELECT COUNT(*) FROM processes", [], |row| row.get(0))?;
    Ok((products as usize, processes as usize))
}
