//! Test utilities for Arbor

use std::fs;
use tempfile::TempDir;

/// Create a temporary TypeScript project with an import graph, a compiled
/// package with declarations, and a runtime built-in import.
///
/// ```text
/// src/index.ts      -> ./services/user, ./util, fs, left-pad
/// src/services/user.ts -> ../util
/// src/util.ts
/// node_modules/left-pad  (compiled .js + .d.ts)
/// ```
pub fn create_test_repo() -> TempDir {
    create_repo_with_structure(&[
        (
            "src/index.ts",
            r#"
import { UserService } from './services/user';
import { clamp } from './util';
import { readFileSync } from 'fs';
import leftPad from 'left-pad';

const service = new UserService();
service.loadUsers(readFileSync('users.json', 'utf8'));
console.log(leftPad(String(clamp(3, 0, 10)), 4));
"#,
        ),
        (
            "src/services/user.ts",
            r#"
import { clamp } from '../util';

export interface User {
    name: string;
    age: number;
}

export class UserService {
    private users: User[] = [];

    loadUsers(raw: string) {
        this.users = JSON.parse(raw);
        return clamp(this.users.length, 0, 100);
    }
}
"#,
        ),
        (
            "src/util.ts",
            r#"
export function clamp(value: number, min: number, max: number): number {
    return Math.min(Math.max(value, min), max);
}
"#,
        ),
        (
            "node_modules/left-pad/package.json",
            r#"{ "name": "left-pad", "main": "index.js" }"#,
        ),
        (
            "node_modules/left-pad/index.js",
            r#"export default function leftPad(str, len) {
    return str.padStart(len);
}
"#,
        ),
        (
            "node_modules/left-pad/index.d.ts",
            r#"export interface PadOptions {
    char?: string;
}
declare function leftPad(str: string, len: number): string;
export default leftPad;
"#,
        ),
    ])
}

/// Create a simple project with two files and no imports
pub fn create_simple_repo() -> TempDir {
    create_repo_with_structure(&[
        ("main.ts", "export const main = () => 'Hello!';\n"),
        (
            "lib.ts",
            "export function add(a: number, b: number): number {\n    return a + b;\n}\n",
        ),
    ])
}

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_repo() {
        let temp_dir = create_test_repo();
        let root = temp_dir.path();

        assert!(root.join("src/index.ts").exists());
        assert!(root.join("src/services/user.ts").exists());
        assert!(root.join("node_modules/left-pad/index.d.ts").exists());
    }

    #[test]
    fn test_create_simple_repo() {
        let temp_dir = create_simple_repo();
        assert!(temp_dir.path().join("main.ts").exists());
        assert!(temp_dir.path().join("lib.ts").exists());
    }
}
