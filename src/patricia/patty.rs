//! The PATTY binary format: a bit-exact on-disk serialization of a
//! [`Trie`](super::node::Trie), loadable read-only via memory map.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use super::node::{Edge, LookupBytes, Node, Trie};

const MAGIC: &[u8; 5] = b"PATTY";
const HEADER_LEN: usize = 5 + 8 * 8;
const NO_USER_DATA: u64 = u64::MAX;

struct Header {
    nodes_count: u64,
    edges_count: u64,
    saved_str_size: u64,
    size: u64,
    lookup_length: u64,
    data_lookup_length: u64,
    root_offset: u64,
    data_lookup_offset: u64,
}

impl Header {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.nodes_count.to_le_bytes());
        out.extend_from_slice(&self.edges_count.to_le_bytes());
        out.extend_from_slice(&self.saved_str_size.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.lookup_length.to_le_bytes());
        out.extend_from_slice(&self.data_lookup_length.to_le_bytes());
        out.extend_from_slice(&self.root_offset.to_le_bytes());
        out.extend_from_slice(&self.data_lookup_offset.to_le_bytes());
    }

    fn read_from(bytes: &[u8]) -> io::Result<Header> {
        if bytes.len() < HEADER_LEN || &bytes[0..5] != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad PATTY magic"));
        }
        let u64_at = |off: usize| u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
        Ok(Header {
            nodes_count: u64_at(5),
            edges_count: u64_at(13),
            saved_str_size: u64_at(21),
            size: u64_at(29),
            lookup_length: u64_at(37),
            data_lookup_length: u64_at(45),
            root_offset: u64_at(53),
            data_lookup_offset: u64_at(61),
        })
    }
}

fn write_node_record(node: &Node, edges_with_offsets: &[(Edge, u64)], out: &mut Vec<u8>) -> u64 {
    let offset = out.len() as u64;
    out.push(if node.is_terminal { 1 } else { 0 });
    out.extend_from_slice(&(edges_with_offsets.len() as u32).to_le_bytes());
    out.extend_from_slice(&node.user_data_offset.unwrap_or(NO_USER_DATA).to_le_bytes());
    for (edge, next_offset) in edges_with_offsets {
        out.extend_from_slice(&edge.str_start.to_le_bytes());
        out.extend_from_slice(&edge.str_len.to_le_bytes());
        out.extend_from_slice(&next_offset.to_le_bytes());
    }
    offset
}

/// Recursively writes `node_id`'s subtree (children first, per the DFS
/// save order) and returns the byte offset of `node_id`'s own record.
fn save_node(trie: &Trie, node_id: u32, out: &mut Vec<u8>) -> u64 {
    let node = &trie.nodes[node_id as usize];
    let mut edges_with_offsets = Vec::with_capacity(node.edges.len());
    for edge in &node.edges {
        let child_offset = save_node(trie, edge.next, out);
        edges_with_offsets.push((edge.clone(), child_offset));
    }
    write_node_record(node, &edges_with_offsets, out)
}

pub fn save(trie: &Trie, path: impl AsRef<Path>) -> io::Result<()> {
    let mut body = Vec::new();
    body.extend(std::iter::repeat(0u8).take(HEADER_LEN));
    let lookup = trie.lookup_bytes();
    body.extend_from_slice(lookup);
    let data_lookup_offset = if trie.data_lookup().is_empty() { 0 } else { body.len() as u64 };
    body.extend_from_slice(trie.data_lookup());

    let root_offset = save_node(trie, trie.root(), &mut body);

    let header = Header {
        nodes_count: trie.node_count() as u64,
        edges_count: trie.edge_count() as u64,
        saved_str_size: 0,
        size: body.len() as u64,
        lookup_length: lookup.len() as u64,
        data_lookup_length: trie.data_lookup().len() as u64,
        root_offset,
        data_lookup_offset,
    };
    let mut header_bytes = Vec::with_capacity(HEADER_LEN);
    header.write_to(&mut header_bytes);
    body[0..HEADER_LEN].copy_from_slice(&header_bytes);

    let mut file = File::create(path)?;
    file.write_all(&body)
}

/// Maps `path` and parses every node/edge record into an owned arena,
/// producing a read-only trie — `insert`/`set` on it always return `false`.
pub fn open(path: impl AsRef<Path>) -> io::Result<Trie> {
    let file = File::open(path)?;
    let mmap = Arc::new(unsafe { Mmap::map(&file)? });
    let bytes: &[u8] = &mmap[..];
    let header = Header::read_from(bytes)?;

    let lookup_start = HEADER_LEN;
    let lookup_end = lookup_start + header.lookup_length as usize;
    let lookup_bytes: Arc<[u8]> = Arc::from(&bytes[lookup_start..lookup_end]);

    let data_lookup = if header.data_lookup_length > 0 {
        let start = header.data_lookup_offset as usize;
        bytes[start..start + header.data_lookup_length as usize].to_vec()
    } else {
        Vec::new()
    };

    let mut nodes: Vec<Node> = Vec::with_capacity(header.nodes_count as usize);
    // Offset (in the file) -> arena NodeId, populated as records are parsed.
    let mut offset_to_id: std::collections::HashMap<u64, u32> = std::collections::HashMap::new();

    fn parse_node(
        bytes: &[u8],
        offset: u64,
        nodes: &mut Vec<Node>,
        offset_to_id: &mut std::collections::HashMap<u64, u32>,
    ) -> io::Result<u32> {
        if let Some(&id) = offset_to_id.get(&offset) {
            return Ok(id);
        }
        let mut pos = offset as usize;
        let is_terminal = bytes[pos] == 1;
        pos += 1;
        let edge_count = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let raw_user_data = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
        pos += 8;
        let user_data_offset = if raw_user_data == NO_USER_DATA { None } else { Some(raw_user_data) };

        let id = nodes.len() as u32;
        nodes.push(Node { is_terminal, user_data_offset, edges: Vec::new() });
        offset_to_id.insert(offset, id);

        let mut edges = Vec::with_capacity(edge_count as usize);
        for _ in 0..edge_count {
            let str_start = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
            pos += 8;
            let str_len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
            pos += 4;
            let next_offset = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
            pos += 8;
            let next_id = parse_node(bytes, next_offset, nodes, offset_to_id)?;
            edges.push(Edge { str_start, str_len, next: next_id });
        }
        nodes[id as usize].edges = edges;
        Ok(id)
    }

    let root_id = parse_node(bytes, header.root_offset, &mut nodes, &mut offset_to_id)?;

    Ok(Trie {
        nodes,
        lookup: LookupBytes::Borrowed(lookup_bytes),
        data_lookup,
        read_only: true,
        root: root_id,
    })
}
