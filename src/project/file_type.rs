//! File extension to Xcode file type mapping.

use camino::Utf8Path;

/// Extensions compiled by an indexer target's sources phase.
const COMPILED_EXTENSIONS: [&str; 10] = ["c", "cc", "cpp", "cxx", "m", "mm", "swift", "s", "S", "metal"];

/// Xcode uniform type identifier for a path.
#[must_use]
pub fn uti_for_path(path: &str) -> &'static str {
    let file_name = Utf8Path::new(path).file_name().unwrap_or(path);
    if matches!(file_name, "BUILD" | "BUILD.bazel") {
        return "text.script.python";
    }
    Utf8Path::new(path)
        .extension()
        .map_or("text", uti_for_extension)
}

/// Xcode uniform type identifier for a bare extension.
#[must_use]
pub fn uti_for_extension(extension: &str) -> &'static str {
    match extension {
        "a" => "archive.ar",
        "app" => "wrapper.application",
        "appex" => "wrapper.app-extension",
        "bundle" => "wrapper.plug-in",
        "c" => "sourcecode.c.c",
        "cc" | "cpp" | "cxx" => "sourcecode.cpp.cpp",
        "entitlements" => "text.plist.entitlements",
        "framework" => "wrapper.framework",
        "h" => "sourcecode.c.h",
        "hh" | "hpp" => "sourcecode.cpp.h",
        "json" => "text.json",
        "m" => "sourcecode.c.objc",
        "metal" => "sourcecode.metal",
        "mm" => "sourcecode.cpp.objcpp",
        "pch" => "sourcecode.c.h",
        "plist" => "text.plist.xml",
        "png" => "image.png",
        "s" | "S" => "sourcecode.asm",
        "storyboard" => "file.storyboard",
        "strings" => "text.plist.strings",
        "swift" => "sourcecode.swift",
        "xcassets" => "folder.assetcatalog",
        "xcdatamodel" => "wrapper.xcdatamodel",
        "xcdatamodeld" => "wrapper.xcdatamodeld",
        "xctest" => "wrapper.cfbundle",
        "xib" => "file.xib",
        _ => "text",
    }
}

/// Whether the indexer compiles files of this path.
#[must_use]
pub fn is_compiled(path: &str) -> bool {
    Utf8Path::new(path)
        .extension()
        .is_some_and(|ext| COMPILED_EXTENSIONS.contains(&ext))
}
