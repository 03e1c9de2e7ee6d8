use criterion::{Criterion, criterion_group, criterion_main};
use featctx_core::language::Language;
use featctx_parser::{SourceFile, patterns_for};
use std::hint::black_box;

const SAMPLE_PYTHON: &str = r#"
import os
from typing import List, Optional
from .storage import (
    Database,
    connect as open_connection,
)

LIMIT = 100

class UserManager:
    """Manages user accounts."""

    def __init__(self, db_url: str):
        self.db_url = db_url
        self.connection = None

    def connect(self) -> bool:
        try:
            self.connection = open_connection(self.db_url)
            return True
        except ConnectionError:
            return False

    def list_users(self, limit: int = LIMIT) -> List[dict]:
        return self.connection.execute("SELECT * FROM users LIMIT ?", (limit,))


def parse_config(path: str) -> dict:
    import toml
    with open(path) as f:
        return toml.load(f)
"#;

const SAMPLE_JS: &str = r"
import React, { useState } from 'react';
import * as api from './api';
export { formatDate, formatTime as time } from './format';
export * from './constants';
const { join } = require('./paths');

export function useUsers() {
  const [users, setUsers] = useState([]);
  return users;
}

export class UserList extends React.Component {
  render() { return null; }
}

const lazy = () => import('./heavy');
export default UserList;
";

fn bench_python_patterns(c: &mut Criterion) {
    let patterns = patterns_for(Language::Python);
    c.bench_function("detect_python", |b| {
        b.iter(|| {
            let file = SourceFile::parse("bench.py", Language::Python, black_box(SAMPLE_PYTHON));
            (patterns.detect_imports(&file), patterns.detect_definitions(&file))
        })
    });
}

fn bench_javascript_patterns(c: &mut Criterion) {
    let patterns = patterns_for(Language::JavaScript);
    c.bench_function("detect_javascript", |b| {
        b.iter(|| {
            let file = SourceFile::parse("bench.js", Language::JavaScript, black_box(SAMPLE_JS));
            (patterns.detect_imports(&file), patterns.detect_definitions(&file))
        })
    });
}

fn bench_detect_only(c: &mut Criterion) {
    // Parsing excluded: the cost of the pattern walk alone.
    let file = SourceFile::parse("bench.py", Language::Python, SAMPLE_PYTHON);
    let patterns = patterns_for(Language::Python);
    c.bench_function("detect_python_preparsed", |b| {
        b.iter(|| patterns.detect_definitions(black_box(&file)))
    });
}

criterion_group!(
    benches,
    bench_python_patterns,
    bench_javascript_patterns,
    bench_detect_only,
);
criterion_main!(benches);
