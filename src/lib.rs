//! # `rstl`
//! Welcome to `rstl` ! This crate turns broadcast subtitle artifacts into structured captions.
//!
//! It covers two related jobs :
//! 1. Decoding a stream of raw teletext packets (ETSI EN 300 706), as demuxed from the ancillary data of a professional video container, into an EBU Tech 3264-E ("STL") subtitle file,
//! 2. Reading an STL file back into [captions](stl::segment::Caption) with timing, inline styling and layout.
//!
//! This is my *interpretation* of the relevant standards. This is because :
//! 1. EN 300 706 describes a 1970s broadcast system bit by bit and assumes one already understands the whole system while reading the document,
//! 2. Tech 3264-E is a disk exchange format from 1991 and real-world files disagree with it constantly,
//! 3. Every toolchain (Adobe Premiere in particular) has its own opinion on what a color code means across a line break,
//! 4. Actual captures come in at least two packet framings depending on which tool demuxed them.
//!
//! # How do subtitles travel in a broadcast ?
//! A subtitle page (usually page 888) is carried as teletext packets in the vertical blanking interval,
//! or in ancillary data (OP-47) for professional digital formats. Each packet addresses one display row
//! of a 24x40 character grid, and in-band control codes set colors, boxing, double height and so on.
//!
//! An external tool demuxes those packets out of the container, this crate never touches the container
//! itself. Feed the packet bytes with their presentation timestamps to a
//! [PageAssembler](teletext::page::PageAssembler) (or use [extract](teletext::extract)), then hand the
//! assembled pages to the [writer](stl::writer) to get STL bytes.
//!
//! The [reader](stl::reader) goes the other way and is deliberately lenient, because files found in the
//! wild rarely follow the continuation-block rules to the letter. Structural problems surface as a
//! single [Diagnostic](error::Diagnostic) per read, never as a parse abort.

pub mod charset;
pub mod coding;
pub mod control;
pub mod error;
pub mod stl;
pub mod teletext;
pub mod timecode;
