//! The BQL parser: one line of text → one operator.

use crate::bql::types::{AggKind, ArithKind, JoinMethod, Operator, SelectOperator};
use crate::catalog::types::{
    Clustering, ColumnRef, IndexKind, IndexSpec, TableRef, MAX_NAME_LEN,
};
use crate::context::GenCol;
use crate::error::{BasaltError, BasaltResult};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parses one client line.
///
/// ## Output
/// - `Ok(Some(op))`: a query to execute
/// - `Ok(None)`: blank line or `--` comment, nothing to do
/// - `Err(BasaltError)`: unknown or malformed command
pub fn parse(line: &str) -> BasaltResult<Option<Operator>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("--") {
        return Ok(None);
    }

    // split "h[,h2]=" off the front; '=' never occurs elsewhere in BQL
    let (handles, command) = match line.find('=') {
        Some(at) => {
            let names: Vec<String> = line[..at]
                .split(',')
                .map(|h| ident(h.trim()))
                .collect::<BasaltResult<_>>()?;
            (names, line[at + 1..].trim())
        }
        None => (Vec::new(), line),
    };

    if command == "shutdown" {
        return no_handles(&handles, Operator::Shutdown);
    }
    if command == "batch_queries()" {
        return no_handles(&handles, Operator::BatchBegin);
    }
    if command == "batch_execute()" {
        return no_handles(&handles, Operator::BatchExecute);
    }

    let open = command.find('(').ok_or_else(|| BasaltError::UnknownCommand {
        command: command.to_string(),
    })?;
    let verb = &command[..open];
    let rest = &command[open + 1..];
    let args_str = rest
        .strip_suffix(')')
        .ok_or_else(|| BasaltError::IncorrectFormat {
            reason: format!("'{}' does not end with ')'", command),
        })?;
    let args: Vec<&str> = if args_str.trim().is_empty() {
        Vec::new()
    } else {
        args_str.split(',').map(str::trim).collect()
    };

    let op = match verb {
        "create" => parse_create(&args)?,
        "relational_insert" => parse_insert(&args)?,
        "load" => parse_load(&args)?,
        "select" => return one_handle(handles, |h| parse_select(h, &args)),
        "fetch" => return one_handle(handles, |h| parse_fetch(h, &args)),
        "sum" => return one_handle(handles, |h| parse_aggregate(h, AggKind::Sum, &args)),
        "avg" => return one_handle(handles, |h| parse_aggregate(h, AggKind::Avg, &args)),
        "min" => return parse_min_max(handles, AggKind::Min, &args).map(Some),
        "max" => return parse_min_max(handles, AggKind::Max, &args).map(Some),
        "add" => return one_handle(handles, |h| parse_arith(h, ArithKind::Add, &args)),
        "sub" => return one_handle(handles, |h| parse_arith(h, ArithKind::Sub, &args)),
        "join" => return parse_join(handles, &args).map(Some),
        "print" => parse_print(&args)?,
        _ => {
            return Err(BasaltError::UnknownCommand {
                command: verb.to_string(),
            })
        }
    };
    no_handles(&handles, op)
}

fn no_handles(handles: &[String], op: Operator) -> BasaltResult<Option<Operator>> {
    if handles.is_empty() {
        Ok(Some(op))
    } else {
        Err(BasaltError::IncorrectFormat {
            reason: "this command does not bind a handle".to_string(),
        })
    }
}

fn one_handle<F>(handles: Vec<String>, build: F) -> BasaltResult<Option<Operator>>
where
    F: FnOnce(String) -> BasaltResult<Operator>,
{
    match <[String; 1]>::try_from(handles) {
        Ok([handle]) => build(handle).map(Some),
        Err(_) => Err(BasaltError::IncorrectFormat {
            reason: "exactly one handle is required".to_string(),
        }),
    }
}

fn ident(name: &str) -> BasaltResult<String> {
    if name.len() > MAX_NAME_LEN || !IDENT_RE.is_match(name) {
        return Err(BasaltError::IncorrectFormat {
            reason: format!("bad name '{}'", name),
        });
    }
    Ok(name.to_string())
}

fn unquote(token: &str) -> BasaltResult<&str> {
    let token = token.trim();
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        Ok(&token[1..token.len() - 1])
    } else {
        Ok(token)
    }
}

fn table_ref(token: &str) -> BasaltResult<TableRef> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [db, table] => Ok(TableRef {
            db: ident(db)?,
            table: ident(table)?,
        }),
        _ => Err(BasaltError::IncorrectFormat {
            reason: format!("'{}' is not a db.table name", token),
        }),
    }
}

fn column_ref(token: &str) -> BasaltResult<ColumnRef> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [db, table, column] => Ok(ColumnRef {
            db: ident(db)?,
            table: ident(table)?,
            column: ident(column)?,
        }),
        _ => Err(BasaltError::IncorrectFormat {
            reason: format!("'{}' is not a db.table.column name", token),
        }),
    }
}

fn gen_col(token: &str) -> BasaltResult<GenCol> {
    if token.contains('.') {
        Ok(GenCol::Base(column_ref(token)?))
    } else {
        Ok(GenCol::Derived(ident(token)?))
    }
}

fn int_literal(token: &str) -> BasaltResult<i32> {
    token.trim().parse().map_err(|_| BasaltError::IncorrectFormat {
        reason: format!("'{}' is not a 32-bit integer", token),
    })
}

/// Range endpoint: `null` means an open bound.
fn bound(token: &str, open: i64) -> BasaltResult<i64> {
    if token == "null" {
        return Ok(open);
    }
    token.parse().map_err(|_| BasaltError::IncorrectFormat {
        reason: format!("'{}' is not a range bound", token),
    })
}

fn index_spec(kind: &str, clustering: &str) -> BasaltResult<IndexSpec> {
    let kind = match kind {
        "btree" => IndexKind::BTree,
        "sorted" => IndexKind::Sorted,
        other => {
            return Err(BasaltError::IncorrectFormat {
                reason: format!("'{}' is not an index kind", other),
            })
        }
    };
    let clustering = match clustering {
        "clustered" => Clustering::Clustered,
        "unclustered" => Clustering::Unclustered,
        other => {
            return Err(BasaltError::IncorrectFormat {
                reason: format!("'{}' is not a clustering", other),
            })
        }
    };
    Ok(IndexSpec { kind, clustering })
}

fn parse_create(args: &[&str]) -> BasaltResult<Operator> {
    match args {
        ["db", name] => Ok(Operator::CreateDb {
            name: ident(unquote(name)?)?,
        }),
        ["tbl", name, db, count] => Ok(Operator::CreateTable {
            db: ident(db)?,
            name: ident(unquote(name)?)?,
            column_count: count.parse().map_err(|_| BasaltError::IncorrectFormat {
                reason: format!("'{}' is not a column count", count),
            })?,
        }),
        ["col", name, table] => Ok(Operator::CreateColumn {
            table: table_ref(table)?,
            name: ident(unquote(name)?)?,
            index: None,
        }),
        ["col", name, table, kind, clustering] => Ok(Operator::CreateColumn {
            table: table_ref(table)?,
            name: ident(unquote(name)?)?,
            index: Some(index_spec(kind, clustering)?),
        }),
        ["idx", column, kind, clustering] => Ok(Operator::CreateIndex {
            column: column_ref(column)?,
            spec: index_spec(kind, clustering)?,
        }),
        _ => Err(BasaltError::IncorrectFormat {
            reason: "unrecognised create form".to_string(),
        }),
    }
}

fn parse_insert(args: &[&str]) -> BasaltResult<Operator> {
    let (table, values) = args.split_first().ok_or_else(|| BasaltError::IncorrectFormat {
        reason: "relational_insert needs a table".to_string(),
    })?;
    Ok(Operator::Insert {
        table: table_ref(table)?,
        values: values.iter().map(|v| int_literal(v)).collect::<BasaltResult<_>>()?,
    })
}

fn parse_load(args: &[&str]) -> BasaltResult<Operator> {
    match args {
        [path] => {
            let path = unquote(path)?;
            if path.is_empty() {
                return Err(BasaltError::IncorrectFormat {
                    reason: "load needs a file path".to_string(),
                });
            }
            Ok(Operator::Load {
                path: path.to_string(),
            })
        }
        _ => Err(BasaltError::IncorrectFormat {
            reason: "load takes exactly one path".to_string(),
        }),
    }
}

fn parse_select(handle: String, args: &[&str]) -> BasaltResult<Operator> {
    match args {
        [column, low, high] if column.contains('.') => Ok(Operator::Select(SelectOperator {
            handle,
            filter: None,
            target: GenCol::Base(column_ref(column)?),
            low: bound(low, i64::MIN)?,
            high: bound(high, i64::MAX)?,
        })),
        [positions, values, low, high] => Ok(Operator::Select(SelectOperator {
            handle,
            filter: Some(ident(positions)?),
            target: GenCol::Derived(ident(values)?),
            low: bound(low, i64::MIN)?,
            high: bound(high, i64::MAX)?,
        })),
        _ => Err(BasaltError::IncorrectFormat {
            reason: "select takes (column, low, high) or (pos, val, low, high)".to_string(),
        }),
    }
}

fn parse_fetch(handle: String, args: &[&str]) -> BasaltResult<Operator> {
    match args {
        [column, positions] => Ok(Operator::Fetch {
            handle,
            column: column_ref(column)?,
            positions: ident(positions)?,
        }),
        _ => Err(BasaltError::IncorrectFormat {
            reason: "fetch takes (column, positions)".to_string(),
        }),
    }
}

fn parse_aggregate(handle: String, kind: AggKind, args: &[&str]) -> BasaltResult<Operator> {
    match args {
        [input] => Ok(Operator::Aggregate {
            handle,
            kind,
            input: gen_col(input)?,
        }),
        _ => Err(BasaltError::IncorrectFormat {
            reason: "aggregate takes one column".to_string(),
        }),
    }
}

/// min/max: one handle aggregates; two handles bind `(positions, values)`
/// of every row attaining the extremum.
fn parse_min_max(
    handles: Vec<String>,
    kind: AggKind,
    args: &[&str],
) -> BasaltResult<Operator> {
    let mut names = handles.into_iter();
    match (names.next(), names.next(), names.next(), args) {
        (Some(handle), None, None, [input]) => Ok(Operator::Aggregate {
            handle,
            kind,
            input: gen_col(input)?,
        }),
        (Some(pos_handle), Some(val_handle), None, [positions, values]) => {
            Ok(Operator::MinMaxIndexed {
                pos_handle,
                val_handle,
                kind,
                positions: if *positions == "null" {
                    None
                } else {
                    Some(gen_col(positions)?)
                },
                values: gen_col(values)?,
            })
        }
        _ => Err(BasaltError::IncorrectFormat {
            reason: "min/max take (col) with one handle or (pos, col) with two".to_string(),
        }),
    }
}

fn parse_arith(handle: String, kind: ArithKind, args: &[&str]) -> BasaltResult<Operator> {
    match args {
        [left, right] => Ok(Operator::Arith {
            handle,
            kind,
            left: gen_col(left)?,
            right: gen_col(right)?,
        }),
        _ => Err(BasaltError::IncorrectFormat {
            reason: "add/sub take two columns".to_string(),
        }),
    }
}

fn parse_join(handles: Vec<String>, args: &[&str]) -> BasaltResult<Operator> {
    let [left_handle, right_handle] =
        <[String; 2]>::try_from(handles).map_err(|_| BasaltError::IncorrectFormat {
            reason: "join binds exactly two handles".to_string(),
        })?;
    match args {
        [lv, lp, rv, rp, method] => {
            let method = match *method {
                "hash" => JoinMethod::Hash,
                "nested-loop" => JoinMethod::NestedLoop,
                other => {
                    return Err(BasaltError::IncorrectFormat {
                        reason: format!("'{}' is not a join method", other),
                    })
                }
            };
            Ok(Operator::Join {
                left_handle,
                right_handle,
                method,
                left_values: gen_col(lv)?,
                left_positions: gen_col(lp)?,
                right_values: gen_col(rv)?,
                right_positions: gen_col(rp)?,
            })
        }
        _ => Err(BasaltError::IncorrectFormat {
            reason: "join takes (val1, pos1, val2, pos2, method)".to_string(),
        }),
    }
}

fn parse_print(args: &[&str]) -> BasaltResult<Operator> {
    if args.is_empty() {
        return Err(BasaltError::IncorrectFormat {
            reason: "print takes at least one column".to_string(),
        });
    }
    Ok(Operator::Print {
        items: args.iter().map(|a| gen_col(a)).collect::<BasaltResult<_>>()?,
    })
}
