use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::record::Record;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS people (
            person_id     TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            birth_name    TEXT,
            birth_date    TEXT,
            birth_place   TEXT,
            spouse        TEXT,
            partner       TEXT,
            num_children  INTEGER,
            website       TEXT,
            genre         TEXT,
            instrument    TEXT,
            label         TEXT,
            loaded_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_people_birth_date ON people(birth_date);

        CREATE TABLE IF NOT EXISTS occupations (
            id            INTEGER PRIMARY KEY,
            person_id     TEXT NOT NULL REFERENCES people(person_id),
            occupation    TEXT NOT NULL,
            UNIQUE(person_id, occupation)
        );
        CREATE INDEX IF NOT EXISTS idx_occupations_value ON occupations(occupation);

        CREATE TABLE IF NOT EXISTS works (
            id            INTEGER PRIMARY KEY,
            person_id     TEXT NOT NULL REFERENCES people(person_id),
            work_title    TEXT NOT NULL,
            UNIQUE(person_id, work_title)
        );

        CREATE TABLE IF NOT EXISTS awards (
            id            INTEGER PRIMARY KEY,
            person_id     TEXT NOT NULL REFERENCES people(person_id),
            award         TEXT NOT NULL,
            UNIQUE(person_id, award)
        );
        ",
    )?;
    Ok(())
}

// ── Saving ──

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveCounts {
    pub people: usize,
    pub occupations: usize,
    pub works: usize,
    pub awards: usize,
}

impl SaveCounts {
    pub fn add(&mut self, other: SaveCounts) {
        self.people += other.people;
        self.occupations += other.occupations;
        self.works += other.works;
        self.awards += other.awards;
    }
}

/// Write `records` in one transaction. A person saved again replaces its
/// row and list values, so reloading a dump is idempotent.
pub fn save_records(conn: &Connection, records: &[Record]) -> Result<SaveCounts> {
    let tx = conn.unchecked_transaction()?;
    let mut counts = SaveCounts::default();
    {
        let mut p_stmt = tx.prepare(
            "INSERT OR REPLACE INTO people
             (person_id, name, birth_name, birth_date, birth_place, spouse, partner,
              num_children, website, genre, instrument, label)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
        )?;
        let satellites = [
            ("occupations", "occupation"),
            ("works", "work_title"),
            ("awards", "award"),
        ];
        let mut clear_stmts = Vec::new();
        let mut insert_stmts = Vec::new();
        for (table, column) in satellites {
            clear_stmts.push(tx.prepare(&format!("DELETE FROM {} WHERE person_id = ?1", table))?);
            insert_stmts.push(tx.prepare(&format!(
                "INSERT OR IGNORE INTO {} (person_id, {}) VALUES (?1, ?2)",
                table, column
            ))?);
        }

        for r in records {
            // Old list values go first so the replaced person row is never referenced.
            for stmt in clear_stmts.iter_mut() {
                stmt.execute([&r.person_id])?;
            }
            counts.people += p_stmt.execute(rusqlite::params![
                r.person_id, r.name, r.birth_name, r.birth_date, r.birth_place,
                r.spouse, r.partner, r.children, r.website, r.genre, r.instrument,
                r.label,
            ])?;

            let lists = [&r.occupation, &r.works, &r.awards];
            let mut inserted = [0usize; 3];
            for (i, items) in lists.into_iter().enumerate() {
                for item in items {
                    inserted[i] += insert_stmts[i].execute(rusqlite::params![r.person_id, item])?;
                }
            }
            counts.occupations += inserted[0];
            counts.works += inserted[1];
            counts.awards += inserted[2];
        }
    }
    tx.commit()?;
    Ok(counts)
}

// ── Search ──

/// Number of children to match: `N` exactly, or `N+` for at least `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenFilter {
    Exactly(u32),
    AtLeast(u32),
}

impl FromStr for ChildrenFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (digits, at_least) = match s.strip_suffix('+') {
            Some(rest) => (rest.trim(), true),
            None => (s, false),
        };
        let n: u32 = digits
            .parse()
            .with_context(|| format!("invalid children filter {:?}, expected N or N+", s))?;
        Ok(if at_least { Self::AtLeast(n) } else { Self::Exactly(n) })
    }
}

#[derive(Debug, Default)]
pub struct SearchFilter {
    /// Substring of the display name.
    pub name: Option<String>,
    /// Four-digit birth year.
    pub year: Option<String>,
    /// Substring of the birth place.
    pub place: Option<String>,
    /// Substring of any one occupation.
    pub occupation: Option<String>,
    pub children: Option<ChildrenFilter>,
    pub limit: usize,
}

pub struct PersonRow {
    pub person_id: String,
    pub name: String,
    pub birth_date: String,
    pub birth_place: String,
    pub spouse: String,
    pub partner: String,
    pub occupations: String,
}

impl PersonRow {
    pub fn has_relationships(&self) -> bool {
        !self.spouse.is_empty() || !self.partner.is_empty()
    }
}

pub fn search_people(conn: &Connection, filter: &SearchFilter) -> Result<Vec<PersonRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(name) = &filter.name {
        conditions.push(format!("p.name LIKE '%' || ?{} || '%'", params.len() + 1));
        params.push(Box::new(name.clone()));
    }
    if let Some(y) = &filter.year {
        conditions.push(format!("substr(p.birth_date, 1, 4) = ?{}", params.len() + 1));
        params.push(Box::new(y.clone()));
    }
    if let Some(place) = &filter.place {
        conditions.push(format!("p.birth_place LIKE '%' || ?{} || '%'", params.len() + 1));
        params.push(Box::new(place.clone()));
    }
    if let Some(occ) = &filter.occupation {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM occupations o
                     WHERE o.person_id = p.person_id AND o.occupation LIKE '%' || ?{} || '%')",
            params.len() + 1
        ));
        params.push(Box::new(occ.clone()));
    }
    match filter.children {
        Some(ChildrenFilter::Exactly(n)) => {
            conditions.push(format!("p.num_children = ?{}", params.len() + 1));
            params.push(Box::new(n));
        }
        Some(ChildrenFilter::AtLeast(n)) => {
            conditions.push(format!("p.num_children >= ?{}", params.len() + 1));
            params.push(Box::new(n));
        }
        None => {}
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT p.person_id, p.name, COALESCE(p.birth_date,''), COALESCE(p.birth_place,''),
                COALESCE(p.spouse,''), COALESCE(p.partner,''),
                COALESCE((SELECT group_concat(occupation, ', ')
                          FROM (SELECT occupation FROM occupations o
                                WHERE o.person_id = p.person_id ORDER BY o.id)), '')
         FROM people p{}
         ORDER BY p.name, p.person_id
         LIMIT {}",
        where_clause, filter.limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(PersonRow {
                person_id: row.get(0)?,
                name: row.get(1)?,
                birth_date: row.get(2)?,
                birth_place: row.get(3)?,
                spouse: row.get(4)?,
                partner: row.get(5)?,
                occupations: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub people: usize,
    pub with_birth_date: usize,
    pub with_children: usize,
    pub occupations: usize,
    pub works: usize,
    pub awards: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    Ok(Stats {
        people: count("SELECT COUNT(*) FROM people")?,
        with_birth_date: count("SELECT COUNT(*) FROM people WHERE birth_date IS NOT NULL")?,
        with_children: count("SELECT COUNT(*) FROM people WHERE num_children IS NOT NULL")?,
        occupations: count("SELECT COUNT(*) FROM occupations")?,
        works: count("SELECT COUNT(*) FROM works")?,
        awards: count("SELECT COUNT(*) FROM awards")?,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn ada() -> Record {
        Record {
            birth_date: Some("1955-03-09".into()),
            birth_place: Some("Leeds, England".into()),
            occupation: vec!["Singer".into(), "actress".into()],
            children: Some(3),
            awards: vec!["Ivor Novello Award (1990)".into()],
            ..Record::new("Ada Example")
        }
    }

    fn bob() -> Record {
        Record {
            birth_date: Some("1960-01-02".into()),
            birth_place: Some("Paris".into()),
            partner: Some("Cy Other".into()),
            occupation: vec!["Painter".into()],
            children: Some(1),
            ..Record::new("Bob Sample")
        }
    }

    #[test]
    fn save_counts_rows() {
        let conn = memory_db();
        let counts = save_records(&conn, &[ada(), bob()]).unwrap();
        assert_eq!(
            counts,
            SaveCounts { people: 2, occupations: 3, works: 0, awards: 1 }
        );
        let children: Option<u32> = conn
            .query_row("SELECT num_children FROM people WHERE person_id = 'Ada Example'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(children, Some(3));
    }

    #[test]
    fn saving_twice_is_idempotent() {
        let conn = memory_db();
        save_records(&conn, &[ada()]).unwrap();
        save_records(&conn, &[ada()]).unwrap();
        let s = get_stats(&conn).unwrap();
        assert_eq!(s.people, 1);
        assert_eq!(s.occupations, 2);
        assert_eq!(s.awards, 1);
    }

    #[test]
    fn resave_replaces_list_values() {
        let conn = memory_db();
        save_records(&conn, &[ada()]).unwrap();
        let updated = Record { occupation: vec!["Composer".into()], ..ada() };
        save_records(&conn, &[updated]).unwrap();
        let rows = search_people(&conn, &SearchFilter { limit: 10, ..Default::default() }).unwrap();
        assert_eq!(rows[0].occupations, "Composer");
    }

    #[test]
    fn absent_values_stored_as_null() {
        let conn = memory_db();
        save_records(&conn, &[Record::new("Nobody")]).unwrap();
        let s = get_stats(&conn).unwrap();
        assert_eq!(s.people, 1);
        assert_eq!(s.with_birth_date, 0);
        assert_eq!(s.with_children, 0);
    }

    #[test]
    fn search_filters() {
        let conn = memory_db();
        save_records(&conn, &[ada(), bob()]).unwrap();

        let all = search_people(&conn, &SearchFilter { limit: 10, ..Default::default() }).unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Example", "Bob Sample"]);
        assert_eq!(all[0].occupations, "Singer, actress");

        let by_year = SearchFilter { year: Some("1960".into()), limit: 10, ..Default::default() };
        assert_eq!(search_people(&conn, &by_year).unwrap()[0].name, "Bob Sample");

        let by_place = SearchFilter { place: Some("leeds".into()), limit: 10, ..Default::default() };
        assert_eq!(search_people(&conn, &by_place).unwrap().len(), 1);

        let by_occ = SearchFilter {
            occupation: Some("painter".into()),
            year: Some("1955".into()),
            limit: 10,
            ..Default::default()
        };
        assert!(search_people(&conn, &by_occ).unwrap().is_empty());
    }

    #[test]
    fn search_by_name_and_occupation_substring() {
        let conn = memory_db();
        save_records(&conn, &[ada(), bob()]).unwrap();

        let by_name = SearchFilter { name: Some("sample".into()), limit: 10, ..Default::default() };
        let rows = search_people(&conn, &by_name).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].partner, "Cy Other");
        assert_eq!(rows[0].spouse, "");

        let by_occ = SearchFilter { occupation: Some("sing".into()), limit: 10, ..Default::default() };
        assert_eq!(search_people(&conn, &by_occ).unwrap()[0].name, "Ada Example");
    }

    #[test]
    fn search_by_children() {
        let conn = memory_db();
        save_records(&conn, &[ada(), bob(), Record::new("Nobody")]).unwrap();

        let names = |children: &str| -> Vec<String> {
            let filter = SearchFilter {
                children: Some(children.parse().unwrap()),
                limit: 10,
                ..Default::default()
            };
            search_people(&conn, &filter).unwrap().into_iter().map(|r| r.name).collect()
        };
        assert_eq!(names("1"), vec!["Bob Sample"]);
        assert_eq!(names("3+"), vec!["Ada Example"]);
        assert_eq!(names("1+"), vec!["Ada Example", "Bob Sample"]);
        assert!(names("0").is_empty());
    }

    #[test]
    fn children_filter_parse() {
        assert_eq!("2".parse::<ChildrenFilter>().unwrap(), ChildrenFilter::Exactly(2));
        assert_eq!(" 3+ ".parse::<ChildrenFilter>().unwrap(), ChildrenFilter::AtLeast(3));
        assert!("three".parse::<ChildrenFilter>().is_err());
        assert!("+".parse::<ChildrenFilter>().is_err());
    }

    #[test]
    fn relationships_present_only_when_recorded() {
        let conn = memory_db();
        let wed = Record { spouse: Some("Tom Sample".into()), ..ada() };
        save_records(&conn, &[wed, Record::new("Nobody")]).unwrap();
        let rows = search_people(&conn, &SearchFilter { limit: 10, ..Default::default() }).unwrap();
        let with: Vec<_> = rows.iter().filter(|r| r.has_relationships()).map(|r| r.name.as_str()).collect();
        assert_eq!(with, vec!["Ada Example"]);
        assert_eq!(rows[0].spouse, "Tom Sample");
    }

    #[test]
    fn search_respects_limit() {
        let conn = memory_db();
        save_records(&conn, &[ada(), bob()]).unwrap();
        let rows = search_people(&conn, &SearchFilter { limit: 1, ..Default::default() }).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
