//! Compiled-in standard-library lookup tables.
//!
//! One table per language family, matched against the first path segment of
//! a component's group (or its name when no group exists), except for C/C++
//! where the whole header name is matched.

use std::collections::HashSet;
use std::sync::LazyLock;

pub static JAVA_ROOTS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["java", "javax", "jdk", "sun"]));

pub static PYTHON_MODULES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "abc", "argparse", "array", "asyncio", "base64", "binascii", "bisect", "builtins",
        "calendar", "collections", "concurrent", "configparser", "contextlib", "copy", "csv",
        "ctypes", "dataclasses", "datetime", "decimal", "difflib", "dis", "email", "enum",
        "errno", "fnmatch", "fractions", "functools", "gc", "getpass", "glob", "gzip", "hashlib",
        "heapq", "hmac", "html", "http", "importlib", "inspect", "io", "itertools", "json",
        "keyword", "logging", "math", "mimetypes", "multiprocessing", "operator", "os",
        "pathlib", "pickle", "platform", "pprint", "queue", "random", "re", "secrets", "select",
        "shlex", "shutil", "signal", "site", "socket", "sqlite3", "ssl", "stat", "statistics",
        "string", "struct", "subprocess", "sys", "tarfile", "tempfile", "textwrap", "threading",
        "time", "timeit", "token", "tokenize", "traceback", "types", "typing", "unicodedata",
        "unittest", "urllib", "uuid", "venv", "warnings", "weakref", "xml", "zipfile", "zlib",
    ])
});

pub static GO_ROOTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "archive", "bufio", "bytes", "compress", "container", "context", "crypto", "database",
        "debug", "embed", "encoding", "errors", "expvar", "flag", "fmt", "go", "hash", "html",
        "image", "index", "io", "log", "maps", "math", "mime", "net", "os", "path", "plugin",
        "reflect", "regexp", "runtime", "slices", "sort", "strconv", "strings", "sync",
        "syscall", "testing", "text", "time", "unicode", "unsafe",
    ])
});

pub static C_CPP_HEADERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        // C
        "assert.h", "ctype.h", "errno.h", "float.h", "inttypes.h", "limits.h", "locale.h",
        "math.h", "setjmp.h", "signal.h", "stdarg.h", "stdbool.h", "stddef.h", "stdint.h",
        "stdio.h", "stdlib.h", "string.h", "time.h", "wchar.h",
        // C++
        "algorithm", "any", "array", "atomic", "bitset", "cassert", "cctype", "cerrno",
        "chrono", "cmath", "complex", "condition_variable", "cstdarg", "cstddef", "cstdint",
        "cstdio", "cstdlib", "cstring", "ctime", "deque", "exception", "filesystem",
        "fstream", "functional", "future", "initializer_list", "iomanip", "ios", "iosfwd",
        "iostream", "istream", "iterator", "limits", "list", "locale", "map", "memory",
        "mutex", "new", "numeric", "optional", "ostream", "queue", "random", "ratio",
        "regex", "set", "span", "sstream", "stack", "stdexcept", "streambuf", "string",
        "string_view", "thread", "tuple", "type_traits", "typeinfo", "unordered_map",
        "unordered_set", "utility", "variant", "vector",
    ])
});

pub static CSHARP_ROOTS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["System", "Microsoft", "Windows"]));

pub static NODE_MODULES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "crypto",
        "dgram", "dns", "events", "fs", "http", "http2", "https", "inspector", "module",
        "net", "os", "path", "perf_hooks", "process", "punycode", "querystring", "readline",
        "repl", "stream", "string_decoder", "timers", "tls", "tty", "url", "util", "v8",
        "vm", "worker_threads", "zlib",
    ])
});

pub static RUBY_MODULES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "base64", "benchmark", "bigdecimal", "cgi", "csv", "date", "digest", "drb", "erb",
        "etc", "fcntl", "fiddle", "fileutils", "find", "forwardable", "getoptlong", "io",
        "ipaddr", "irb", "json", "logger", "monitor", "net", "nkf", "objspace", "observer",
        "open-uri", "open3", "openssl", "optparse", "ostruct", "pathname", "pp", "prettyprint",
        "pstore", "psych", "rbconfig", "rdoc", "readline", "resolv", "rexml", "rinda", "ripper",
        "securerandom", "set", "shellwords", "singleton", "socket", "stringio", "strscan",
        "syslog", "tempfile", "time", "timeout", "tmpdir", "tsort", "uri", "weakref", "yaml",
        "zlib",
    ])
});

pub static SCALA_ROOTS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["scala", "java", "javax"]));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_roots() {
        assert!(JAVA_ROOTS.contains("java"));
        assert!(JAVA_ROOTS.contains("javax"));
        assert!(!JAVA_ROOTS.contains("org"));
    }

    #[test]
    fn test_python_modules() {
        assert!(PYTHON_MODULES.contains("os"));
        assert!(PYTHON_MODULES.contains("typing"));
        assert!(!PYTHON_MODULES.contains("requests"));
    }

    #[test]
    fn test_cpp_headers() {
        assert!(C_CPP_HEADERS.contains("stdio.h"));
        assert!(C_CPP_HEADERS.contains("vector"));
        assert!(!C_CPP_HEADERS.contains("boost"));
    }

    #[test]
    fn test_node_modules() {
        assert!(NODE_MODULES.contains("fs"));
        assert!(!NODE_MODULES.contains("react"));
    }
}
